//! Program-derived addresses of the ledger and the Arcium accounts its
//! instructions need.

use anchor_lang::prelude::Pubkey;
use arcium_anchor::prelude::{ARCIUM_PROG_ID, SIGN_PDA_SEED};
use arcium_client::pda;
use encrypted_prediction::constants::{LEDGER_SEED, PREDICTION_SEED, VOTER_SEED};

pub fn ledger_address(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[LEDGER_SEED], program_id).0
}

pub fn prediction_address(program_id: &Pubkey, id: u32) -> Pubkey {
    Pubkey::find_program_address(&[PREDICTION_SEED, &id.to_le_bytes()], program_id).0
}

pub fn voter_record_address(program_id: &Pubkey, id: u32, voter: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[VOTER_SEED, &id.to_le_bytes(), voter.as_ref()], program_id).0
}

pub fn sign_pda_address(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[&SIGN_PDA_SEED[..]], program_id).0
}

/// Addresses owned by the Arcium program for one MXE and cluster.
#[derive(Debug, Clone, Copy)]
pub struct ArciumAddresses {
    program_id: Pubkey,
    cluster_offset: u32,
}

impl ArciumAddresses {
    pub fn new(program_id: Pubkey, cluster_offset: u32) -> Self {
        Self {
            program_id,
            cluster_offset,
        }
    }

    pub fn arcium_program() -> Pubkey {
        ARCIUM_PROG_ID
    }

    pub fn mxe(&self) -> Pubkey {
        pda::mxe_acc(&self.program_id)
    }

    pub fn mempool(&self) -> Pubkey {
        pda::mempool_acc(self.cluster_offset)
    }

    pub fn executing_pool(&self) -> Pubkey {
        pda::execpool_acc(self.cluster_offset)
    }

    pub fn cluster(&self) -> Pubkey {
        pda::cluster_acc(self.cluster_offset)
    }

    pub fn computation(&self, computation_offset: u64) -> Pubkey {
        pda::computation_acc(self.cluster_offset, computation_offset)
    }

    pub fn comp_def(&self, comp_def_offset: u32) -> Pubkey {
        pda::computation_definition_acc(&self.program_id, comp_def_offset)
    }
}

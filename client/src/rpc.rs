//! Ledger access over Solana JSON-RPC through `anchor-client`.

use std::rc::Rc;

use anchor_client::{Client, ClientError as RpcError, Cluster, Program};
use anchor_lang::solana_program::program_error::ProgramError;
use anchor_lang::prelude::Pubkey;
use anchor_lang::{system_program, AccountDeserialize};
use arcium_anchor::prelude::{ARCIUM_CLOCK_ACCOUNT_ADDRESS, ARCIUM_FEE_POOL_ACCOUNT_ADDRESS};
use encrypted_prediction::constants::{
    COMP_DEF_OFFSET_INIT_TALLIES, COMP_DEF_OFFSET_REVEAL_TALLIES, COMP_DEF_OFFSET_SUBMIT_VOTE,
};
use encrypted_prediction::{accounts, instruction, LedgerAccount, PredictionAccount};
use log::debug;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::InstructionError;
use solana_sdk::signature::{read_keypair_file, Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::TransactionError;

use crate::addresses::{self, ArciumAddresses};
use crate::codec::EncryptedChoice;
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::ledger::{LedgerReader, LedgerWriter, Prediction};

pub struct RpcLedger {
    program: Program<Rc<Keypair>>,
    program_id: Pubkey,
    signer: Pubkey,
    arcium: ArciumAddresses,
}

impl RpcLedger {
    pub fn connect(config: &Config) -> Result<Self> {
        let keypair_path = config.keypair_path();
        let payer = read_keypair_file(&keypair_path).map_err(|e| {
            ClientError::Config(format!("cannot read keypair {}: {e}", keypair_path.display()))
        })?;
        let signer = payer.pubkey();

        let cluster: Cluster = config
            .rpc_url
            .parse()
            .map_err(|e| ClientError::Config(format!("bad rpc url {}: {e}", config.rpc_url)))?;
        let client = Client::new_with_options(cluster, Rc::new(payer), CommitmentConfig::confirmed());
        let program = client
            .program(config.program_id)
            .map_err(ClientError::transport)?;

        Ok(Self {
            program,
            program_id: config.program_id,
            signer,
            arcium: ArciumAddresses::new(config.program_id, config.cluster_offset),
        })
    }

    pub fn ledger_address(&self) -> Pubkey {
        addresses::ledger_address(&self.program_id)
    }

    /// Raw account data, `None` if the account doesn't exist.
    fn fetch(&self, address: &Pubkey) -> Result<Option<(Pubkey, Vec<u8>)>> {
        let mut accounts = self
            .program
            .rpc()
            .get_multiple_accounts(&[*address])
            .map_err(ClientError::transport)?;
        Ok(accounts.pop().flatten().map(|a| (a.owner, a.data)))
    }

    fn settle(sent: std::result::Result<Signature, RpcError>) -> Result<String> {
        sent.map(|signature| signature.to_string())
            .map_err(classify)
    }

    pub fn initialize_ledger(&self) -> Result<String> {
        Self::settle(
            self.program
                .request()
                .accounts(accounts::InitializeLedger {
                    payer: self.signer,
                    ledger_acc: self.ledger_address(),
                    system_program: system_program::ID,
                })
                .args(instruction::InitializeLedger {})
                .send(),
        )
    }
}

/// Rejections carrying a program error code become the matching named error.
/// Anything else left the outcome unknown.
fn classify(err: RpcError) -> ClientError {
    match err {
        RpcError::AnchorError(e) => e.into(),
        RpcError::ProgramError(ProgramError::Custom(code)) => ClientError::from_program_code(code),
        RpcError::SolanaClientError(e) => match e.get_transaction_error() {
            Some(TransactionError::InstructionError(_, InstructionError::Custom(code))) => {
                ClientError::from_program_code(code)
            }
            Some(TransactionError::InstructionError(_, other)) => {
                ClientError::Program(other.to_string())
            }
            _ => ClientError::transport(e),
        },
        other => ClientError::transport(other),
    }
}

impl LedgerReader for RpcLedger {
    fn prediction_count(&self) -> Result<u32> {
        let (_, data) = self
            .fetch(&self.ledger_address())?
            .ok_or(ClientError::LedgerNotInitialized)?;
        let ledger = LedgerAccount::try_deserialize(&mut data.as_slice())?;
        Ok(ledger.prediction_count)
    }

    fn prediction(&self, id: u32) -> Result<Prediction> {
        let address = addresses::prediction_address(&self.program_id, id);
        let (_, data) = self
            .fetch(&address)?
            .ok_or(ClientError::PredictionNotFound(id))?;
        let acc = PredictionAccount::try_deserialize(&mut data.as_slice())?;
        Ok(Prediction::from(&acc))
    }

    fn has_user_voted(&self, id: u32, voter: &Pubkey) -> Result<bool> {
        let address = addresses::voter_record_address(&self.program_id, id, voter);
        Ok(self
            .fetch(&address)?
            .is_some_and(|(owner, data)| owner == self.program_id && !data.is_empty()))
    }
}

impl LedgerWriter for RpcLedger {
    fn signer(&self) -> Pubkey {
        self.signer
    }

    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn create_prediction(&self, title: &str, options: &[String]) -> Result<u32> {
        // The account is derived from the count at execution time; if another
        // creation lands first the seeds no longer match and this one fails.
        let id = self.prediction_count()?;
        let computation_offset: u64 = rand::random();
        debug!("creating prediction {id} with computation {computation_offset}");

        Self::settle(
            self.program
                .request()
                .accounts(accounts::CreatePrediction {
                    payer: self.signer,
                    sign_pda_account: addresses::sign_pda_address(&self.program_id),
                    mxe_account: self.arcium.mxe(),
                    mempool_account: self.arcium.mempool(),
                    executing_pool: self.arcium.executing_pool(),
                    computation_account: self.arcium.computation(computation_offset),
                    comp_def_account: self.arcium.comp_def(COMP_DEF_OFFSET_INIT_TALLIES),
                    cluster_account: self.arcium.cluster(),
                    pool_account: ARCIUM_FEE_POOL_ACCOUNT_ADDRESS,
                    clock_account: ARCIUM_CLOCK_ACCOUNT_ADDRESS,
                    system_program: system_program::ID,
                    arcium_program: ArciumAddresses::arcium_program(),
                    ledger_acc: self.ledger_address(),
                    prediction_acc: addresses::prediction_address(&self.program_id, id),
                })
                .args(instruction::CreatePrediction {
                    computation_offset,
                    title: title.to_string(),
                    options: options.to_vec(),
                    nonce: rand::random(),
                })
                .send(),
        )?;
        Ok(id)
    }

    fn submit_vote(&self, id: u32, choice: &EncryptedChoice) -> Result<String> {
        let computation_offset: u64 = rand::random();
        debug!("voting on prediction {id} with computation {computation_offset}");

        Self::settle(
            self.program
                .request()
                .accounts(accounts::SubmitVote {
                    payer: self.signer,
                    sign_pda_account: addresses::sign_pda_address(&self.program_id),
                    mxe_account: self.arcium.mxe(),
                    mempool_account: self.arcium.mempool(),
                    executing_pool: self.arcium.executing_pool(),
                    computation_account: self.arcium.computation(computation_offset),
                    comp_def_account: self.arcium.comp_def(COMP_DEF_OFFSET_SUBMIT_VOTE),
                    cluster_account: self.arcium.cluster(),
                    pool_account: ARCIUM_FEE_POOL_ACCOUNT_ADDRESS,
                    clock_account: ARCIUM_CLOCK_ACCOUNT_ADDRESS,
                    system_program: system_program::ID,
                    arcium_program: ArciumAddresses::arcium_program(),
                    prediction_acc: addresses::prediction_address(&self.program_id, id),
                    voter_record: addresses::voter_record_address(&self.program_id, id, &self.signer),
                })
                .args(instruction::SubmitVote {
                    computation_offset,
                    id,
                    choice: *choice.handle.as_bytes(),
                    vote_encryption_pubkey: choice.proof.public_key,
                    vote_nonce: choice.proof.nonce,
                })
                .send(),
        )
    }

    fn close_prediction(&self, id: u32) -> Result<String> {
        let computation_offset: u64 = rand::random();
        debug!("closing prediction {id} with computation {computation_offset}");

        Self::settle(
            self.program
                .request()
                .accounts(accounts::ClosePrediction {
                    payer: self.signer,
                    sign_pda_account: addresses::sign_pda_address(&self.program_id),
                    mxe_account: self.arcium.mxe(),
                    mempool_account: self.arcium.mempool(),
                    executing_pool: self.arcium.executing_pool(),
                    computation_account: self.arcium.computation(computation_offset),
                    comp_def_account: self.arcium.comp_def(COMP_DEF_OFFSET_REVEAL_TALLIES),
                    cluster_account: self.arcium.cluster(),
                    pool_account: ARCIUM_FEE_POOL_ACCOUNT_ADDRESS,
                    clock_account: ARCIUM_CLOCK_ACCOUNT_ADDRESS,
                    system_program: system_program::ID,
                    arcium_program: ArciumAddresses::arcium_program(),
                    prediction_acc: addresses::prediction_address(&self.program_id, id),
                })
                .args(instruction::ClosePrediction {
                    computation_offset,
                    id,
                })
                .send(),
        )
    }

    fn retry_init_tallies(&self, id: u32) -> Result<String> {
        let computation_offset: u64 = rand::random();
        debug!("re-queueing tallies of prediction {id} with computation {computation_offset}");

        Self::settle(
            self.program
                .request()
                .accounts(accounts::RetryInitTallies {
                    payer: self.signer,
                    sign_pda_account: addresses::sign_pda_address(&self.program_id),
                    mxe_account: self.arcium.mxe(),
                    mempool_account: self.arcium.mempool(),
                    executing_pool: self.arcium.executing_pool(),
                    computation_account: self.arcium.computation(computation_offset),
                    comp_def_account: self.arcium.comp_def(COMP_DEF_OFFSET_INIT_TALLIES),
                    cluster_account: self.arcium.cluster(),
                    pool_account: ARCIUM_FEE_POOL_ACCOUNT_ADDRESS,
                    clock_account: ARCIUM_CLOCK_ACCOUNT_ADDRESS,
                    system_program: system_program::ID,
                    arcium_program: ArciumAddresses::arcium_program(),
                    prediction_acc: addresses::prediction_address(&self.program_id, id),
                })
                .args(instruction::RetryInitTallies {
                    computation_offset,
                    id,
                    nonce: rand::random(),
                })
                .send(),
        )
    }

    fn retry_reveal(&self, id: u32) -> Result<String> {
        let computation_offset: u64 = rand::random();
        debug!("re-queueing reveal of prediction {id} with computation {computation_offset}");

        Self::settle(
            self.program
                .request()
                .accounts(accounts::RetryReveal {
                    payer: self.signer,
                    sign_pda_account: addresses::sign_pda_address(&self.program_id),
                    mxe_account: self.arcium.mxe(),
                    mempool_account: self.arcium.mempool(),
                    executing_pool: self.arcium.executing_pool(),
                    computation_account: self.arcium.computation(computation_offset),
                    comp_def_account: self.arcium.comp_def(COMP_DEF_OFFSET_REVEAL_TALLIES),
                    cluster_account: self.arcium.cluster(),
                    pool_account: ARCIUM_FEE_POOL_ACCOUNT_ADDRESS,
                    clock_account: ARCIUM_CLOCK_ACCOUNT_ADDRESS,
                    system_program: system_program::ID,
                    arcium_program: ArciumAddresses::arcium_program(),
                    prediction_acc: addresses::prediction_address(&self.program_id, id),
                })
                .args(instruction::RetryReveal {
                    computation_offset,
                    id,
                })
                .send(),
        )
    }
}

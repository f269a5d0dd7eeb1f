use anchor_lang::prelude::Pubkey;
use encrypted_prediction::PredictionAccount;

use crate::codec::{CiphertextHandle, EncryptedChoice};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionState {
    Active,
    /// Terminal: voting frozen, counters marked for public decryption.
    Closed,
}

/// Client copy of one prediction as last read from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub id: u32,
    pub creator: Pubkey,
    pub title: String,
    pub options: Vec<String>,
    pub encrypted_counts: Vec<CiphertextHandle>,
    pub is_active: bool,
    pub results_are_public: bool,
    pub created_at: i64,
    /// Zero while active.
    pub closed_at: i64,
    pub voter_count: u32,
    /// An encrypted computation on the counters is in flight.
    pub computation_pending: bool,
    pub tallies_ready: bool,
    /// Present once public decryption has completed.
    pub revealed_counts: Option<Vec<u64>>,
}

impl Prediction {
    pub fn state(&self) -> PredictionState {
        if self.is_active {
            PredictionState::Active
        } else {
            PredictionState::Closed
        }
    }

    pub fn closed_at(&self) -> Option<i64> {
        (self.closed_at != 0).then_some(self.closed_at)
    }
}

impl From<&PredictionAccount> for Prediction {
    fn from(acc: &PredictionAccount) -> Self {
        Self {
            id: acc.id,
            creator: acc.creator,
            title: acc.title.clone(),
            options: acc.options.clone(),
            encrypted_counts: acc
                .encrypted_counts()
                .iter()
                .copied()
                .map(CiphertextHandle::new)
                .collect(),
            is_active: acc.is_active,
            results_are_public: acc.results_are_public,
            created_at: acc.created_at,
            closed_at: acc.closed_at,
            voter_count: acc.voter_count,
            computation_pending: acc.computation_pending,
            tallies_ready: acc.tallies_ready,
            revealed_counts: acc.revealed().map(<[u64]>::to_vec),
        }
    }
}

/// Pure reads. Callable by anyone.
pub trait LedgerReader {
    fn prediction_count(&self) -> Result<u32>;

    /// Fails with `PredictionNotFound` for ids outside `0..prediction_count`.
    fn prediction(&self, id: u32) -> Result<Prediction>;

    /// False for unknown predictions.
    fn has_user_voted(&self, id: u32, voter: &Pubkey) -> Result<bool>;
}

/// Signed, state-changing requests. Each either applies fully or not at all.
pub trait LedgerWriter {
    /// The identity that signs writes.
    fn signer(&self) -> Pubkey;

    fn program_id(&self) -> Pubkey;

    /// Returns the id the new prediction was created at.
    fn create_prediction(&self, title: &str, options: &[String]) -> Result<u32>;

    /// Returns the transaction signature.
    fn submit_vote(&self, id: u32, choice: &EncryptedChoice) -> Result<String>;

    /// Returns the transaction signature.
    fn close_prediction(&self, id: u32) -> Result<String>;

    /// Queue tally initialization again after it aborted.
    fn retry_init_tallies(&self, id: u32) -> Result<String>;

    /// Queue the reveal of a closed prediction again after it aborted.
    fn retry_reveal(&self, id: u32) -> Result<String>;
}

use anchor_lang::prelude::*;

#[event]
pub struct PredictionCreatedEvent {
    pub prediction_id: u32,
    pub creator: Pubkey,
    pub num_options: u8,
    pub created_at: i64,
}

/// Carries no information about the chosen option.
#[event]
pub struct VoteCastEvent {
    pub prediction_id: u32,
    pub voter_count: u32,
    pub timestamp: i64,
}

#[event]
pub struct ComputationAbortedEvent {
    pub prediction_id: u32,
    /// Name of the encrypted instruction that aborted.
    pub computation: String,
    pub timestamp: i64,
}

#[event]
pub struct ComputationRequeuedEvent {
    pub prediction_id: u32,
    pub computation: String,
    pub requested_by: Pubkey,
}

#[event]
pub struct PredictionClosedEvent {
    pub prediction_id: u32,
    pub closed_by: Pubkey,
    pub closed_at: i64,
    pub voter_count: u32,
}

#[event]
pub struct ResultsRevealedEvent {
    pub prediction_id: u32,
    /// One plaintext total per option, in option order.
    pub counts: Vec<u64>,
}

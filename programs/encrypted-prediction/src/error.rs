use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    #[msg("Cluster not set")]
    ClusterNotSet,
    #[msg("A prediction needs between 2 and 4 options")]
    InvalidOptionCount,
    #[msg("Prediction title cannot be empty")]
    EmptyTitle,
    #[msg("Prediction title is too long")]
    TitleTooLong,
    #[msg("Prediction options cannot be empty")]
    EmptyOption,
    #[msg("Prediction option is too long")]
    OptionTooLong,
    #[msg("Prediction is already closed")]
    PredictionAlreadyClosed,
    #[msg("Already voted on this prediction")]
    AlreadyVoted,
    #[msg("An encrypted computation is still pending for this prediction")]
    ComputationPending,
    #[msg("Results are not public")]
    ResultsNotPublic,
    #[msg("Ledger cannot hold more predictions")]
    LedgerFull,
    #[msg("Encrypted tallies are not initialized")]
    TalliesNotReady,
    #[msg("Encrypted tallies are already initialized")]
    TalliesAlreadyReady,
    #[msg("Results are already revealed")]
    ResultsAlreadyRevealed,
}

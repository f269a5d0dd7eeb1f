use anchor_lang::error::Error as ProgramFailure;
use encrypted_prediction::ErrorCode;
use thiserror::Error;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ClientError {
    // validation: rejected before anything is sent
    #[error("{0}")]
    Validation(String),

    // state conflicts: the ledger refused, nothing changed
    #[error("prediction {0} not found")]
    PredictionNotFound(u32),
    #[error("prediction is already closed")]
    PredictionAlreadyClosed,
    #[error("already voted on this prediction")]
    AlreadyVoted,
    #[error("an encrypted computation is still pending for this prediction")]
    ComputationPending,
    #[error("encrypted tallies are not initialized yet")]
    TalliesNotReady,
    #[error("results are not public yet")]
    ResultsNotPublic,
    #[error("public decryption has not completed yet")]
    ResultsPending,
    #[error("prediction ledger is not initialized")]
    LedgerNotInitialized,
    #[error("program rejected the request: {0}")]
    Program(String),

    // transport: retry may succeed
    #[error("ledger request failed: {0}")]
    Transport(String),
    #[error("encryption service unavailable: {0}")]
    Encryptor(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    /// Map a custom program error number, as found in a failed transaction,
    /// back to the program's `ErrorCode`.
    pub fn from_program_code(code: u32) -> Self {
        PROGRAM_CODES
            .iter()
            .find(|&&known| u32::from(known) == code)
            .map(|&known| ProgramFailure::from(known).into())
            .unwrap_or_else(|| Self::Program(format!("custom program error {code:#x}")))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            Self::PredictionNotFound(_)
                | Self::PredictionAlreadyClosed
                | Self::AlreadyVoted
                | Self::ComputationPending
                | Self::TalliesNotReady
                | Self::ResultsNotPublic
                | Self::ResultsPending
                | Self::LedgerNotInitialized
                | Self::Program(_)
        )
    }

    /// The outcome of the request is unknown; re-read before assuming anything.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Encryptor(_))
    }
}

impl From<ProgramFailure> for ClientError {
    fn from(err: ProgramFailure) -> Self {
        let is = |code: ErrorCode| err == ProgramFailure::from(code);

        if is(ErrorCode::PredictionAlreadyClosed) {
            Self::PredictionAlreadyClosed
        } else if is(ErrorCode::AlreadyVoted) {
            Self::AlreadyVoted
        } else if is(ErrorCode::ComputationPending) {
            Self::ComputationPending
        } else if is(ErrorCode::TalliesNotReady) {
            Self::TalliesNotReady
        } else if is(ErrorCode::ResultsNotPublic) {
            Self::ResultsNotPublic
        } else if is(ErrorCode::InvalidOptionCount)
            || is(ErrorCode::EmptyTitle)
            || is(ErrorCode::TitleTooLong)
            || is(ErrorCode::EmptyOption)
            || is(ErrorCode::OptionTooLong)
        {
            Self::Validation(program_message(&err))
        } else {
            Self::Program(program_message(&err))
        }
    }
}

const PROGRAM_CODES: [ErrorCode; 14] = [
    ErrorCode::ClusterNotSet,
    ErrorCode::InvalidOptionCount,
    ErrorCode::EmptyTitle,
    ErrorCode::TitleTooLong,
    ErrorCode::EmptyOption,
    ErrorCode::OptionTooLong,
    ErrorCode::PredictionAlreadyClosed,
    ErrorCode::AlreadyVoted,
    ErrorCode::ComputationPending,
    ErrorCode::ResultsNotPublic,
    ErrorCode::LedgerFull,
    ErrorCode::TalliesNotReady,
    ErrorCode::TalliesAlreadyReady,
    ErrorCode::ResultsAlreadyRevealed,
];

fn program_message(err: &ProgramFailure) -> String {
    match err {
        ProgramFailure::AnchorError(e) => e.error_msg.clone(),
        ProgramFailure::ProgramError(e) => e.program_error.to_string(),
    }
}

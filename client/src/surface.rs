//! User actions: input validation, encrypt-then-submit, and refresh after
//! every write.
//!
//! When a write fails in transit its outcome is unknown, so the ledger is
//! read again and the state found there is what gets reported.

use std::fmt;

use encrypted_prediction::constants::{MAX_OPTIONS, MAX_OPTION_LEN, MAX_TITLE_LEN, MIN_OPTIONS};
use log::{info, warn};

use crate::codec::{ChoiceEncryptor, PublicDecryptor};
use crate::error::{ClientError, Result};
use crate::ledger::{LedgerReader, LedgerWriter};
use crate::sync::SyncLayer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Vote,
    Close,
    Decrypt,
    Retry,
    Refresh,
}

impl Action {
    pub fn success_message(&self) -> &'static str {
        match self {
            Action::Create => "Prediction created successfully.",
            Action::Vote => "Vote submitted.",
            Action::Close => "Prediction closed and results unlocked.",
            Action::Decrypt => "Results decrypted.",
            Action::Retry => "Computation queued again.",
            Action::Refresh => "Predictions refreshed.",
        }
    }

    /// One line naming the action and why it failed. Nothing is retried.
    pub fn failure_message(&self, err: &ClientError) -> String {
        format!("{self} failed: {err}")
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Create => "Creation",
            Action::Vote => "Voting",
            Action::Close => "Closing",
            Action::Decrypt => "Decryption",
            Action::Retry => "Retry",
            Action::Refresh => "Refresh",
        })
    }
}

/// Split a comma separated option list, dropping blank entries.
pub fn parse_options(raw: &str) -> Result<Vec<String>> {
    let options: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect();

    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
        return Err(ClientError::Validation(format!(
            "You must pass between {MIN_OPTIONS} and {MAX_OPTIONS} options"
        )));
    }
    if let Some(long) = options.iter().find(|o| o.len() > MAX_OPTION_LEN) {
        return Err(ClientError::Validation(format!(
            "Option \"{long}\" is longer than {MAX_OPTION_LEN} bytes"
        )));
    }
    Ok(options)
}

pub fn validate_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ClientError::Validation("Prediction title cannot be empty.".into()));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(ClientError::Validation(format!(
            "Prediction title is longer than {MAX_TITLE_LEN} bytes"
        )));
    }
    Ok(title.to_string())
}

pub struct PredictionService<L, E, D> {
    sync: SyncLayer<L>,
    encryptor: E,
    decryptor: D,
}

impl<L, E, D> PredictionService<L, E, D>
where
    L: LedgerReader + LedgerWriter,
    E: ChoiceEncryptor,
    D: PublicDecryptor,
{
    pub fn new(ledger: L, encryptor: E, decryptor: D) -> Self {
        let viewer = ledger.signer();
        Self {
            sync: SyncLayer::new(ledger, Some(viewer)),
            encryptor,
            decryptor,
        }
    }

    pub fn sync(&self) -> &SyncLayer<L> {
        &self.sync
    }

    pub fn ledger(&self) -> &L {
        self.sync.reader()
    }

    fn refresh_after_write(&self) {
        if let Err(e) = self.sync.refresh() {
            warn!("refresh after write failed: {e}");
        }
    }

    pub fn create(&self, title: &str, raw_options: &str) -> Result<u32> {
        let options = parse_options(raw_options)?;
        let title = validate_title(title)?;
        let ledger = self.ledger();

        let before = ledger.prediction_count()?;
        let id = match ledger.create_prediction(&title, &options) {
            Ok(id) => id,
            Err(e) if e.is_transport() => self.find_created(before, &title).ok_or(e)?,
            Err(e) => return Err(e),
        };

        info!("created prediction {id}");
        self.refresh_after_write();
        Ok(id)
    }

    /// After an ambiguous create, look for our prediction past `before`.
    fn find_created(&self, before: u32, title: &str) -> Option<u32> {
        let ledger = self.ledger();
        let signer = ledger.signer();
        let after = ledger.prediction_count().ok()?;
        (before..after).find(|&id| {
            ledger
                .prediction(id)
                .map(|p| p.creator == signer && p.title == title)
                .unwrap_or(false)
        })
    }

    pub fn vote(&self, id: u32, choice: u8) -> Result<()> {
        let ledger = self.ledger();
        let voter = ledger.signer();

        let prediction = ledger.prediction(id)?;
        if !prediction.is_active {
            return Err(ClientError::PredictionAlreadyClosed);
        }
        if ledger.has_user_voted(id, &voter)? {
            return Err(ClientError::AlreadyVoted);
        }
        if prediction.computation_pending {
            return Err(ClientError::ComputationPending);
        }
        if !prediction.tallies_ready {
            return Err(ClientError::TalliesNotReady);
        }
        if usize::from(choice) >= prediction.options.len() {
            return Err(ClientError::Validation(format!(
                "Choice must be between 0 and {}",
                prediction.options.len() - 1
            )));
        }

        let encrypted = self
            .encryptor
            .encrypt_choice(choice, &ledger.program_id(), &voter)?;

        match ledger.submit_vote(id, &encrypted) {
            Ok(signature) => info!("vote on prediction {id} landed in {signature}"),
            Err(e @ ClientError::Transport(_)) => {
                if ledger.has_user_voted(id, &voter)? {
                    warn!("vote on prediction {id} landed despite: {e}");
                } else if !ledger.prediction(id)?.is_active {
                    return Err(ClientError::PredictionAlreadyClosed);
                } else {
                    return Err(e);
                }
            }
            Err(e) => return Err(e),
        }

        self.refresh_after_write();
        Ok(())
    }

    /// Anyone may close an active prediction.
    pub fn close(&self, id: u32) -> Result<()> {
        let ledger = self.ledger();

        let prediction = ledger.prediction(id)?;
        if !prediction.is_active {
            return Err(ClientError::PredictionAlreadyClosed);
        }
        if prediction.computation_pending {
            return Err(ClientError::ComputationPending);
        }
        if !prediction.tallies_ready {
            return Err(ClientError::TalliesNotReady);
        }

        match ledger.close_prediction(id) {
            Ok(signature) => info!("closed prediction {id} in {signature}"),
            Err(e @ ClientError::Transport(_)) => {
                if ledger.prediction(id)?.is_active {
                    return Err(e);
                }
                warn!("prediction {id} is closed despite: {e}");
            }
            Err(e) => return Err(e),
        }

        self.refresh_after_write();
        Ok(())
    }

    /// Queue the aborted computation of a prediction again: tally
    /// initialization while active, the reveal once closed.
    pub fn retry(&self, id: u32) -> Result<()> {
        let ledger = self.ledger();

        let prediction = ledger.prediction(id)?;
        if prediction.computation_pending {
            return Err(ClientError::ComputationPending);
        }
        let sent = if prediction.is_active && !prediction.tallies_ready {
            ledger.retry_init_tallies(id)
        } else if prediction.results_are_public && prediction.revealed_counts.is_none() {
            ledger.retry_reveal(id)
        } else {
            return Err(ClientError::Validation(format!(
                "Prediction {id} has no aborted computation to retry"
            )));
        };

        match sent {
            Ok(signature) => info!("re-queued computation for prediction {id} in {signature}"),
            Err(e @ ClientError::Transport(_)) => {
                let now = ledger.prediction(id)?;
                let landed = now.computation_pending
                    || now.tallies_ready != prediction.tallies_ready
                    || now.revealed_counts != prediction.revealed_counts;
                if !landed {
                    return Err(e);
                }
                warn!("retry for prediction {id} landed despite: {e}");
            }
            Err(e) => return Err(e),
        }

        self.refresh_after_write();
        Ok(())
    }

    /// Re-read the prediction, then decrypt its public totals.
    pub fn decrypt(&self, id: u32) -> Result<Vec<(String, u64)>> {
        self.sync.refresh()?;
        self.sync.decrypt_results(id, &self.decryptor)
    }
}

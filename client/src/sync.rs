//! Keeps a read-only snapshot of the ledger for interaction surfaces.
//!
//! Every refresh takes a ticket. A fetch is committed only if no newer
//! ticket was issued while it ran, so the latest request always wins and a
//! slow, older fetch can't overwrite a newer snapshot.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anchor_lang::prelude::Pubkey;
use log::{debug, warn};

use crate::codec::PublicDecryptor;
use crate::error::{ClientError, Result};
use crate::ledger::{LedgerReader, Prediction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRecord {
    pub prediction: Prediction,
    /// Whether the viewer has voted. False without a viewer.
    pub has_voted: bool,
    /// Session-only plaintext totals, present after an explicit decrypt.
    pub decrypted_counts: Option<Vec<u64>>,
}

impl PredictionRecord {
    /// Option labels paired with decrypted totals, if decrypted.
    pub fn results(&self) -> Option<Vec<(String, u64)>> {
        let counts = self.decrypted_counts.as_ref()?;
        Some(
            self.prediction
                .options
                .iter()
                .cloned()
                .zip(counts.iter().copied())
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { predictions: usize },
    /// A newer refresh was issued while this one ran; its result was dropped.
    Stale,
}

#[derive(Debug, Default)]
struct SyncState {
    issued: u64,
    in_flight: usize,
    records: Vec<PredictionRecord>,
    decrypted: HashMap<u32, Vec<u64>>,
}

pub struct SyncLayer<R> {
    reader: R,
    viewer: Option<Pubkey>,
    state: Mutex<SyncState>,
}

impl<R: LedgerReader> SyncLayer<R> {
    pub fn new(reader: R, viewer: Option<Pubkey>) -> Self {
        Self {
            reader,
            viewer,
            state: Mutex::new(SyncState::default()),
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn viewer(&self) -> Option<Pubkey> {
        self.viewer
    }

    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch and commit in one call.
    pub fn refresh(&self) -> Result<RefreshOutcome> {
        let ticket = self.begin_refresh();
        let fetched = self.fetch();
        self.complete_refresh(ticket, fetched)
    }

    pub fn begin_refresh(&self) -> RefreshTicket {
        let mut state = self.state();
        state.issued += 1;
        state.in_flight += 1;
        RefreshTicket(state.issued)
    }

    /// Read every prediction and the viewer's voted flag. Holds no lock.
    pub fn fetch(&self) -> Result<Vec<PredictionRecord>> {
        let count = self.reader.prediction_count()?;
        let mut records = Vec::with_capacity(count as usize);
        for id in 0..count {
            let prediction = self.reader.prediction(id)?;
            let has_voted = match &self.viewer {
                Some(viewer) => self.reader.has_user_voted(id, viewer)?,
                None => false,
            };
            records.push(PredictionRecord {
                prediction,
                has_voted,
                decrypted_counts: None,
            });
        }
        Ok(records)
    }

    pub fn complete_refresh(
        &self,
        ticket: RefreshTicket,
        fetched: Result<Vec<PredictionRecord>>,
    ) -> Result<RefreshOutcome> {
        let mut state = self.state();
        state.in_flight = state.in_flight.saturating_sub(1);

        if ticket.0 < state.issued {
            debug!("dropping refresh {} (latest is {})", ticket.0, state.issued);
            return Ok(RefreshOutcome::Stale);
        }

        let mut records = fetched.map_err(|e| {
            warn!("Failed to load predictions: {e}");
            e
        })?;
        for record in &mut records {
            record.decrypted_counts = state.decrypted.get(&record.prediction.id).cloned();
        }
        let predictions = records.len();
        state.records = records;
        Ok(RefreshOutcome::Applied { predictions })
    }

    pub fn is_syncing(&self) -> bool {
        self.state().in_flight > 0
    }

    pub fn snapshot(&self) -> Vec<PredictionRecord> {
        self.state().records.clone()
    }

    pub fn record(&self, id: u32) -> Option<PredictionRecord> {
        self.state()
            .records
            .iter()
            .find(|r| r.prediction.id == id)
            .cloned()
    }

    /// Decrypt a closed prediction's totals and keep them for this session.
    ///
    /// Only meaningful once `results_are_public`; counts map positionally onto
    /// option labels.
    pub fn decrypt_results<D: PublicDecryptor>(
        &self,
        id: u32,
        decryptor: &D,
    ) -> Result<Vec<(String, u64)>> {
        let record = self.record(id).ok_or(ClientError::PredictionNotFound(id))?;
        if !record.prediction.results_are_public {
            return Err(ClientError::ResultsNotPublic);
        }

        let counts = decryptor.public_decrypt(&record.prediction)?;
        if counts.len() != record.prediction.options.len() {
            return Err(ClientError::Program(format!(
                "decrypted {} counts for {} options",
                counts.len(),
                record.prediction.options.len()
            )));
        }

        let mut state = self.state();
        state.decrypted.insert(id, counts.clone());
        if let Some(r) = state.records.iter_mut().find(|r| r.prediction.id == id) {
            r.decrypted_counts = Some(counts.clone());
        }

        Ok(record.prediction.options.into_iter().zip(counts).collect())
    }
}

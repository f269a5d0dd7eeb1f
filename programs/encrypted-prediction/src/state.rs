use anchor_lang::prelude::*;

use crate::constants::*;
use crate::error::ErrorCode;

/// Append-only index of every prediction ever created.
#[account]
#[derive(InitSpace, Default)]
pub struct LedgerAccount {
    pub bump: u8,
    pub authority: Pubkey,
    /// Ids `0..prediction_count` are allocated; ids are never reused.
    pub prediction_count: u32,
}

impl LedgerAccount {
    /// Reserve the next sequential id.
    pub fn allocate_id(&mut self) -> Result<u32> {
        let id = self.prediction_count;
        self.prediction_count = id.checked_add(1).ok_or(ErrorCode::LedgerFull)?;
        Ok(id)
    }
}

/// One poll with encrypted per-option tallies.
#[account]
#[derive(InitSpace, Default)]
pub struct PredictionAccount {
    pub bump: u8,
    /// Encrypted vote counters, 4 x 32 bytes. Must directly follow `bump`:
    /// the circuits read them at `VOTE_STATE_OFFSET`.
    pub vote_state: [[u8; 32]; 4],
    /// Nonce of the Mxe ciphertexts in `vote_state`.
    pub nonce: u128,
    pub id: u32,
    pub creator: Pubkey,
    #[max_len(100)]
    pub title: String,
    #[max_len(4, 32)]
    pub options: Vec<String>,
    pub is_active: bool,
    pub results_are_public: bool,
    pub results_revealed: bool,
    /// Set while an encrypted computation over `vote_state` is queued.
    pub computation_pending: bool,
    /// Set once `vote_state` holds ciphertexts produced by the MXE.
    pub tallies_ready: bool,
    pub created_at: i64,
    /// Zero while active.
    pub closed_at: i64,
    pub voter_count: u32,
    pub revealed_counts: [u64; 4],
}

impl PredictionAccount {
    /// Validate creation input before anything is written.
    pub fn validate_new(title: &str, options: &[String]) -> Result<()> {
        require!(
            (MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()),
            ErrorCode::InvalidOptionCount
        );
        require!(!title.trim().is_empty(), ErrorCode::EmptyTitle);
        require!(title.len() <= MAX_TITLE_LEN, ErrorCode::TitleTooLong);
        for option in options {
            require!(!option.trim().is_empty(), ErrorCode::EmptyOption);
            require!(option.len() <= MAX_OPTION_LEN, ErrorCode::OptionTooLong);
        }
        Ok(())
    }

    /// Fill a freshly allocated account. Counters stay locked until the
    /// `init_tallies` callback stores encrypted zeros.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        &mut self,
        id: u32,
        creator: Pubkey,
        title: String,
        options: Vec<String>,
        nonce: u128,
        now: i64,
        bump: u8,
    ) {
        self.bump = bump;
        self.vote_state = [[0; 32]; MAX_OPTIONS];
        self.nonce = nonce;
        self.id = id;
        self.creator = creator;
        self.title = title;
        self.options = options;
        self.is_active = true;
        self.results_are_public = false;
        self.results_revealed = false;
        self.computation_pending = true;
        self.tallies_ready = false;
        self.created_at = now;
        self.closed_at = 0;
        self.voter_count = 0;
        self.revealed_counts = [0; MAX_OPTIONS];
    }

    pub fn num_options(&self) -> u8 {
        self.options.len() as u8
    }

    /// The accumulator handles, one per option and in option order.
    pub fn encrypted_counts(&self) -> &[[u8; 32]] {
        &self.vote_state[..self.options.len().min(MAX_OPTIONS)]
    }

    /// Plaintext totals, one per option, once the reveal callback has landed.
    pub fn revealed(&self) -> Option<&[u64]> {
        self.results_revealed
            .then(|| &self.revealed_counts[..self.options.len().min(MAX_OPTIONS)])
    }

    /// Check a vote may be queued and lock the counters for it.
    ///
    /// A closed prediction rejects every vote first, whatever the caller's
    /// voting history.
    pub fn accept_vote(&mut self, already_voted: bool) -> Result<()> {
        require!(self.is_active, ErrorCode::PredictionAlreadyClosed);
        require!(!already_voted, ErrorCode::AlreadyVoted);
        require!(!self.computation_pending, ErrorCode::ComputationPending);
        require!(self.tallies_ready, ErrorCode::TalliesNotReady);

        self.voter_count = self
            .voter_count
            .checked_add(1)
            .ok_or(ProgramError::ArithmeticOverflow)?;
        self.computation_pending = true;
        Ok(())
    }

    /// Store new counter ciphertexts and unlock.
    pub fn store_tallies(&mut self, ciphertexts: [[u8; 32]; 4], nonce: u128) {
        self.vote_state = ciphertexts;
        self.nonce = nonce;
        self.tallies_ready = true;
        self.computation_pending = false;
    }

    /// Unlock after an aborted computation; counters keep their last value.
    pub fn release_computation(&mut self) {
        self.computation_pending = false;
    }

    /// Queue `init_tallies` again after it aborted. Anyone may ask.
    pub fn retry_init(&mut self, nonce: u128) -> Result<()> {
        require!(self.is_active, ErrorCode::PredictionAlreadyClosed);
        require!(!self.computation_pending, ErrorCode::ComputationPending);
        require!(!self.tallies_ready, ErrorCode::TalliesAlreadyReady);

        self.nonce = nonce;
        self.computation_pending = true;
        Ok(())
    }

    /// Freeze voting and mark every counter for public decryption. The
    /// counters stay locked until the reveal callback lands.
    pub fn close(&mut self, now: i64) -> Result<()> {
        require!(self.is_active, ErrorCode::PredictionAlreadyClosed);
        require!(!self.computation_pending, ErrorCode::ComputationPending);
        require!(self.tallies_ready, ErrorCode::TalliesNotReady);

        self.is_active = false;
        self.closed_at = now;
        self.results_are_public = true;
        self.computation_pending = true;
        Ok(())
    }

    /// Queue `reveal_tallies` again after it aborted. `closed_at` is kept.
    pub fn retry_reveal(&mut self) -> Result<()> {
        require!(self.results_are_public, ErrorCode::ResultsNotPublic);
        require!(!self.results_revealed, ErrorCode::ResultsAlreadyRevealed);
        require!(!self.computation_pending, ErrorCode::ComputationPending);

        self.computation_pending = true;
        Ok(())
    }

    pub fn publish_results(&mut self, counts: [u64; 4]) -> Result<()> {
        require!(self.results_are_public, ErrorCode::ResultsNotPublic);
        self.revealed_counts = counts;
        self.results_revealed = true;
        self.computation_pending = false;
        Ok(())
    }
}

/// Marks that `voter` voted on prediction `prediction_id`; holds no choice.
#[account]
#[derive(InitSpace, Default)]
pub struct VoterRecord {
    pub bump: u8,
    pub prediction_id: u32,
    pub voter: Pubkey,
    pub has_voted: bool,
}

impl VoterRecord {
    pub fn mark(&mut self, prediction_id: u32, voter: Pubkey, bump: u8) {
        self.bump = bump;
        self.prediction_id = prediction_id;
        self.voter = voter;
        self.has_voted = true;
    }
}

/// Read-only copy of a prediction returned by `get_prediction`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PredictionView {
    pub id: u32,
    pub creator: Pubkey,
    pub title: String,
    pub options: Vec<String>,
    pub encrypted_counts: Vec<[u8; 32]>,
    pub is_active: bool,
    pub results_are_public: bool,
    pub computation_pending: bool,
    pub tallies_ready: bool,
    pub created_at: i64,
    pub closed_at: i64,
    pub voter_count: u32,
    pub revealed_counts: Option<Vec<u64>>,
}

impl From<&PredictionAccount> for PredictionView {
    fn from(acc: &PredictionAccount) -> Self {
        Self {
            id: acc.id,
            creator: acc.creator,
            title: acc.title.clone(),
            options: acc.options.clone(),
            encrypted_counts: acc.encrypted_counts().to_vec(),
            is_active: acc.is_active,
            results_are_public: acc.results_are_public,
            computation_pending: acc.computation_pending,
            tallies_ready: acc.tallies_ready,
            created_at: acc.created_at,
            closed_at: acc.closed_at,
            voter_count: acc.voter_count,
            revealed_counts: acc.revealed().map(<[u64]>::to_vec),
        }
    }
}

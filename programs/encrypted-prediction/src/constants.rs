use arcium_anchor::prelude::*;

// Computation definition offsets for each encrypted instruction
pub const COMP_DEF_OFFSET_INIT_TALLIES: u32 = comp_def_offset("init_tallies");
pub const COMP_DEF_OFFSET_SUBMIT_VOTE: u32 = comp_def_offset("submit_vote");
pub const COMP_DEF_OFFSET_REVEAL_TALLIES: u32 = comp_def_offset("reveal_tallies");

pub const LEDGER_SEED: &[u8] = b"ledger";
pub const PREDICTION_SEED: &[u8] = b"prediction";
pub const VOTER_SEED: &[u8] = b"voter";

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 4;
pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_OPTION_LEN: usize = 32;

/// Offset of `vote_state` inside a prediction account: discriminator + bump.
pub const VOTE_STATE_OFFSET: u32 = 8 + 1;
/// Four encrypted u64 counters, 32 bytes each.
pub const VOTE_STATE_LEN: u32 = 32 * MAX_OPTIONS as u32;

//! An in-memory ledger that runs the program's account transitions and plays
//! the MXE's part with plaintext stand-ins for ciphertexts.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use anchor_lang::prelude::Pubkey;
use encrypted_prediction::constants::MAX_OPTIONS;
use encrypted_prediction::{LedgerAccount, PredictionAccount, VoterRecord};
use prediction_client::codec::InputProof;
use prediction_client::{
    ChoiceEncryptor, CiphertextHandle, ClientError, EncryptedChoice, LedgerReader, LedgerWriter,
    Prediction, PredictionService, Result, RevealedTallies,
};

/// A queued MXE computation, run when callbacks are released.
enum Pending {
    Init { id: u32, nonce: u128 },
    Vote { id: u32, choice: u8 },
    Reveal { id: u32 },
}

#[derive(Default)]
struct Chain {
    ledger: LedgerAccount,
    predictions: Vec<PredictionAccount>,
    voters: HashSet<(u32, Pubkey)>,
    queue: Vec<Pending>,
    hold_callbacks: bool,
    drop_next_response: bool,
    abort_next_computation: bool,
    clock: i64,
}

/// Counter `i` lives in the first 8 bytes of its slot.
fn seal_counts(counts: [u64; MAX_OPTIONS]) -> [[u8; 32]; MAX_OPTIONS] {
    let mut slots = [[0u8; 32]; MAX_OPTIONS];
    for (slot, count) in slots.iter_mut().zip(counts) {
        slot[..8].copy_from_slice(&count.to_le_bytes());
    }
    slots
}

fn open_counts(slots: &[[u8; 32]; MAX_OPTIONS]) -> [u64; MAX_OPTIONS] {
    let mut counts = [0u64; MAX_OPTIONS];
    for (count, slot) in counts.iter_mut().zip(slots) {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&slot[..8]);
        *count = u64::from_le_bytes(bytes);
    }
    counts
}

impl Chain {
    fn account(&mut self, id: u32) -> Result<&mut PredictionAccount> {
        self.predictions
            .get_mut(id as usize)
            .ok_or(ClientError::PredictionNotFound(id))
    }

    fn run(&mut self, pending: Pending) -> Result<()> {
        if std::mem::take(&mut self.abort_next_computation) {
            let id = match pending {
                Pending::Init { id, .. } | Pending::Vote { id, .. } | Pending::Reveal { id } => id,
            };
            self.account(id)?.release_computation();
            return Ok(());
        }
        match pending {
            Pending::Init { id, nonce } => {
                self.account(id)?.store_tallies(seal_counts([0; MAX_OPTIONS]), nonce);
            }
            Pending::Vote { id, choice } => {
                let acc = self.account(id)?;
                let mut counts = open_counts(&acc.vote_state);
                // Out of range choices are counted nowhere.
                if choice < acc.num_options() {
                    counts[choice as usize] += 1;
                }
                let nonce = acc.nonce + 1;
                acc.store_tallies(seal_counts(counts), nonce);
            }
            Pending::Reveal { id } => {
                let acc = self.account(id)?;
                let counts = open_counts(&acc.vote_state);
                acc.publish_results(counts)?;
            }
        }
        Ok(())
    }

    fn queue(&mut self, pending: Pending) -> Result<()> {
        if self.hold_callbacks {
            self.queue.push(pending);
            Ok(())
        } else {
            self.run(pending)
        }
    }

    /// Applied writes can still lose their response.
    fn respond<T>(&mut self, value: T) -> Result<T> {
        if std::mem::take(&mut self.drop_next_response) {
            return Err(ClientError::transport("connection reset before confirmation"));
        }
        Ok(value)
    }
}

#[derive(Clone)]
pub struct MemoryLedger {
    chain: Rc<RefCell<Chain>>,
    signer: Pubkey,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            chain: Rc::default(),
            signer: Pubkey::new_unique(),
        }
    }

    /// Another handle on the same ledger, signing as `signer`.
    pub fn connect(&self, signer: Pubkey) -> Self {
        Self {
            chain: Rc::clone(&self.chain),
            signer,
        }
    }

    pub fn advance_clock(&self, secs: i64) {
        self.chain.borrow_mut().clock += secs;
    }

    pub fn hold_callbacks(&self) {
        self.chain.borrow_mut().hold_callbacks = true;
    }

    /// Run every queued computation in order and stop holding.
    pub fn release_callbacks(&self) {
        let mut chain = self.chain.borrow_mut();
        chain.hold_callbacks = false;
        for pending in std::mem::take(&mut chain.queue) {
            chain.run(pending).expect("queued computation failed");
        }
    }

    pub fn drop_next_response(&self) {
        self.chain.borrow_mut().drop_next_response = true;
    }

    /// The next computation to run aborts: its callback only unlocks.
    pub fn abort_next_computation(&self) {
        self.chain.borrow_mut().abort_next_computation = true;
    }
}

impl LedgerReader for MemoryLedger {
    fn prediction_count(&self) -> Result<u32> {
        Ok(self.chain.borrow().ledger.prediction_count)
    }

    fn prediction(&self, id: u32) -> Result<Prediction> {
        self.chain
            .borrow()
            .predictions
            .get(id as usize)
            .map(Prediction::from)
            .ok_or(ClientError::PredictionNotFound(id))
    }

    fn has_user_voted(&self, id: u32, voter: &Pubkey) -> Result<bool> {
        Ok(self.chain.borrow().voters.contains(&(id, *voter)))
    }
}

impl LedgerWriter for MemoryLedger {
    fn signer(&self) -> Pubkey {
        self.signer
    }

    fn program_id(&self) -> Pubkey {
        encrypted_prediction::ID
    }

    fn create_prediction(&self, title: &str, options: &[String]) -> Result<u32> {
        let mut chain = self.chain.borrow_mut();
        PredictionAccount::validate_new(title, options)?;

        let id = chain.ledger.allocate_id()?;
        let mut acc = PredictionAccount::default();
        acc.open(id, self.signer, title.to_string(), options.to_vec(), 1, chain.clock, 255);
        chain.predictions.push(acc);

        chain.queue(Pending::Init { id, nonce: 1 })?;
        chain.respond(id)
    }

    fn submit_vote(&self, id: u32, choice: &EncryptedChoice) -> Result<String> {
        let mut chain = self.chain.borrow_mut();
        let already_voted = chain.voters.contains(&(id, self.signer));
        chain.account(id)?.accept_vote(already_voted)?;

        let mut record = VoterRecord::default();
        record.mark(id, self.signer, 255);
        chain.voters.insert((record.prediction_id, record.voter));

        chain.queue(Pending::Vote {
            id,
            choice: choice.handle.as_bytes()[0],
        })?;
        chain.respond(format!("vote-{id}"))
    }

    fn close_prediction(&self, id: u32) -> Result<String> {
        let mut chain = self.chain.borrow_mut();
        let now = chain.clock;
        chain.account(id)?.close(now)?;

        chain.queue(Pending::Reveal { id })?;
        chain.respond(format!("close-{id}"))
    }

    fn retry_init_tallies(&self, id: u32) -> Result<String> {
        let mut chain = self.chain.borrow_mut();
        chain.account(id)?.retry_init(2)?;

        chain.queue(Pending::Init { id, nonce: 2 })?;
        chain.respond(format!("retry-init-{id}"))
    }

    fn retry_reveal(&self, id: u32) -> Result<String> {
        let mut chain = self.chain.borrow_mut();
        chain.account(id)?.retry_reveal()?;

        chain.queue(Pending::Reveal { id })?;
        chain.respond(format!("retry-reveal-{id}"))
    }
}

/// Puts the plaintext choice in the first byte of the handle.
pub struct PlainEncryptor;

impl ChoiceEncryptor for PlainEncryptor {
    fn encrypt_choice(&self, choice: u8, _program: &Pubkey, _voter: &Pubkey) -> Result<EncryptedChoice> {
        let mut bytes = [0u8; 32];
        bytes[0] = choice;
        Ok(EncryptedChoice {
            handle: CiphertextHandle::new(bytes),
            proof: InputProof {
                public_key: [7; 32],
                nonce: 42,
            },
        })
    }
}

pub type TestService = PredictionService<MemoryLedger, PlainEncryptor, RevealedTallies>;

pub fn service(ledger: &MemoryLedger) -> TestService {
    PredictionService::new(ledger.clone(), PlainEncryptor, RevealedTallies)
}

/// A service for a fresh voter on the same ledger.
pub fn voter(ledger: &MemoryLedger) -> TestService {
    PredictionService::new(ledger.connect(Pubkey::new_unique()), PlainEncryptor, RevealedTallies)
}

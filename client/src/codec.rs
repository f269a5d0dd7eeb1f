//! Client side of the ciphertext collaborator.
//!
//! Ciphertexts are opaque values here. Encryption is delegated to an external
//! helper that speaks the MXE's key exchange; public decryption is whatever
//! the ledger's reveal step published.

use std::fmt;
use std::process::Command;

use anchor_lang::prelude::Pubkey;
use log::debug;
use serde::Deserialize;

use crate::error::{ClientError, Result};
use crate::ledger::Prediction;

/// An opaque 32-byte ciphertext.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CiphertextHandle([u8; 32]);

impl CiphertextHandle {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CiphertextHandle({})", self)
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Binds a ciphertext to the voter's key exchange with the MXE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputProof {
    pub public_key: [u8; 32],
    pub nonce: u128,
}

/// An encrypted option index ready for `submit_vote`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptedChoice {
    pub handle: CiphertextHandle,
    pub proof: InputProof,
}

pub trait ChoiceEncryptor {
    fn encrypt_choice(&self, choice: u8, program: &Pubkey, voter: &Pubkey) -> Result<EncryptedChoice>;
}

pub trait PublicDecryptor {
    /// Plaintext totals for a prediction, in option order.
    fn public_decrypt(&self, prediction: &Prediction) -> Result<Vec<u64>>;
}

/// Runs an external encryption helper and reads one JSON object from its
/// stdout: `{"ciphertext": hex, "publicKey": hex, "nonce": "<decimal>"}`.
///
/// The helper is called as `<program> <args..> --program <id> --voter <key> --choice <n>`.
#[derive(Debug, Clone)]
pub struct CommandEncryptor {
    program: String,
    args: Vec<String>,
}

impl CommandEncryptor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace separated command line, e.g. `"node encrypt.js"`.
    pub fn from_command_line(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| ClientError::Config("encryptor command is empty".into()))?;
        Ok(Self::new(program, parts.collect()))
    }
}

impl ChoiceEncryptor for CommandEncryptor {
    fn encrypt_choice(&self, choice: u8, program: &Pubkey, voter: &Pubkey) -> Result<EncryptedChoice> {
        debug!("encrypting choice via {}", self.program);
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--program")
            .arg(program.to_string())
            .arg("--voter")
            .arg(voter.to_string())
            .arg("--choice")
            .arg(choice.to_string())
            .output()
            .map_err(|e| ClientError::Encryptor(format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClientError::Encryptor(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        parse_sealed_choice(&String::from_utf8_lossy(&output.stdout))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SealedChoice {
    ciphertext: String,
    public_key: String,
    nonce: String,
}

pub fn parse_sealed_choice(raw: &str) -> Result<EncryptedChoice> {
    let sealed: SealedChoice = serde_json::from_str(raw.trim())
        .map_err(|e| ClientError::Encryptor(format!("malformed encryptor output: {e}")))?;

    let nonce = sealed
        .nonce
        .parse::<u128>()
        .map_err(|e| ClientError::Encryptor(format!("bad nonce: {e}")))?;

    Ok(EncryptedChoice {
        handle: CiphertextHandle::new(decode_32("ciphertext", &sealed.ciphertext)?),
        proof: InputProof {
            public_key: decode_32("publicKey", &sealed.public_key)?,
            nonce,
        },
    })
}

fn decode_32(field: &str, value: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| ClientError::Encryptor(format!("{field}: {e}")))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| ClientError::Encryptor(format!("{field}: expected 32 bytes, got {}", b.len())))
}

/// Reads the totals the ledger's reveal callback published.
#[derive(Debug, Default, Clone, Copy)]
pub struct RevealedTallies;

impl PublicDecryptor for RevealedTallies {
    fn public_decrypt(&self, prediction: &Prediction) -> Result<Vec<u64>> {
        if !prediction.results_are_public {
            return Err(ClientError::ResultsNotPublic);
        }
        prediction
            .revealed_counts
            .clone()
            .ok_or(ClientError::ResultsPending)
    }
}

//! Client for the encrypted prediction ledger: a refreshable read model, the
//! ciphertext collaborator seam, and the actions behind the `predictions` CLI.

pub mod addresses;
pub mod codec;
pub mod config;
pub mod error;
pub mod ledger;
pub mod rpc;
pub mod surface;
pub mod sync;

pub use codec::{ChoiceEncryptor, CiphertextHandle, CommandEncryptor, EncryptedChoice, PublicDecryptor, RevealedTallies};
pub use config::Config;
pub use error::{ClientError, Result};
pub use ledger::{LedgerReader, LedgerWriter, Prediction, PredictionState};
pub use rpc::RpcLedger;
pub use surface::{Action, PredictionService};
pub use sync::{PredictionRecord, RefreshOutcome, SyncLayer};

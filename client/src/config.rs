//! Connection settings, read from flags or the environment.

use std::path::PathBuf;
use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use clap::Args;

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// JSON-RPC endpoint, or a cluster moniker such as `devnet`.
    #[arg(long, env = "PREDICTION_RPC_URL", default_value = "http://127.0.0.1:8899")]
    pub rpc_url: String,

    /// Keypair that signs and pays for writes.
    #[arg(long, env = "PREDICTION_KEYPAIR", default_value = "~/.config/solana/id.json")]
    pub keypair: PathBuf,

    #[arg(long, env = "PREDICTION_PROGRAM_ID", default_value_t = encrypted_prediction::ID)]
    pub program_id: Pubkey,

    /// Arcium cluster the MXE computations are queued on.
    #[arg(long, env = "ARCIUM_CLUSTER_OFFSET", default_value_t = 0)]
    pub cluster_offset: u32,

    /// Command that encrypts a choice for the MXE, e.g. `node encrypt.js`.
    #[arg(long, env = "PREDICTION_ENCRYPTOR")]
    pub encryptor: Option<String>,

    /// Seconds between background refreshes in `watch`.
    #[arg(long, env = "PREDICTION_REFRESH_SECS", default_value_t = 12)]
    pub refresh_secs: u64,
}

impl Config {
    /// The keypair path with a leading `~` expanded.
    pub fn keypair_path(&self) -> PathBuf {
        match (self.keypair.strip_prefix("~"), std::env::var_os("HOME")) {
            (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
            _ => self.keypair.clone(),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        config: Config,
    }

    fn parse(args: &[&str]) -> Config {
        Cli::try_parse_from(std::iter::once("predictions").chain(args.iter().copied()))
            .unwrap()
            .config
    }

    #[test]
    fn flags_override_defaults() {
        let program = Pubkey::new_unique();
        let config = parse(&[
            "--rpc-url",
            "devnet",
            "--program-id",
            &program.to_string(),
            "--cluster-offset",
            "768109697",
            "--refresh-secs",
            "0",
        ]);
        assert_eq!(config.rpc_url, "devnet");
        assert_eq!(config.program_id, program);
        assert_eq!(config.cluster_offset, 768109697);
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn absolute_keypair_path_is_kept() {
        let config = parse(&["--keypair", "/tmp/payer.json"]);
        assert_eq!(config.keypair_path(), PathBuf::from("/tmp/payer.json"));
    }

    #[test]
    fn bad_program_id_is_rejected() {
        let parsed = Cli::try_parse_from(["predictions", "--program-id", "not-a-key"]);
        assert!(parsed.is_err());
    }
}

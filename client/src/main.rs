use std::process::ExitCode;
use std::thread;

use anchor_lang::prelude::Pubkey;
use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info};
use prediction_client::{
    Action, ChoiceEncryptor, ClientError, CommandEncryptor, Config, EncryptedChoice, LedgerReader,
    PredictionRecord, PredictionService, RefreshOutcome, RevealedTallies, RpcLedger,
};

#[derive(Parser)]
#[command(name = "predictions", version, about = "Confidential prediction polls")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the signer and ledger addresses.
    Address,
    /// Create the ledger account. Done once per deployment.
    Init,
    /// Open a new prediction.
    Create {
        #[arg(long)]
        title: String,
        /// Comma separated, 2 to 4 entries.
        #[arg(long)]
        options: String,
    },
    /// Cast an encrypted vote.
    Vote {
        #[arg(long)]
        id: u32,
        /// Zero-based option index.
        #[arg(long)]
        choice: u8,
    },
    /// End voting and unlock the totals.
    Close {
        #[arg(long)]
        id: u32,
    },
    /// Show the public totals of a closed prediction.
    Decrypt {
        #[arg(long)]
        id: u32,
    },
    /// Queue an aborted tally initialization or reveal again.
    Retry {
        #[arg(long)]
        id: u32,
    },
    /// Print every prediction once.
    List,
    /// Print predictions and refresh them periodically.
    Watch,
}

impl Command {
    fn action(&self) -> Action {
        match self {
            Command::Create { .. } => Action::Create,
            Command::Vote { .. } => Action::Vote,
            Command::Close { .. } => Action::Close,
            Command::Decrypt { .. } => Action::Decrypt,
            Command::Retry { .. } => Action::Retry,
            Command::Address | Command::Init | Command::List | Command::Watch => Action::Refresh,
        }
    }
}

/// The encryptor from configuration, if one was given.
struct ConfiguredEncryptor(Option<CommandEncryptor>);

impl ChoiceEncryptor for ConfiguredEncryptor {
    fn encrypt_choice(
        &self,
        choice: u8,
        program: &Pubkey,
        voter: &Pubkey,
    ) -> prediction_client::Result<EncryptedChoice> {
        match &self.0 {
            Some(encryptor) => encryptor.encrypt_choice(choice, program, voter),
            None => Err(ClientError::Config(
                "voting needs an encryptor, set --encryptor or PREDICTION_ENCRYPTOR".into(),
            )),
        }
    }
}

fn print_record(record: &PredictionRecord) {
    let p = &record.prediction;
    let state = if p.is_active { "active" } else { "closed" };
    let voted = if record.has_voted { ", voted" } else { "" };
    println!("#{} {} [{state}{voted}] {} votes", p.id, p.title, p.voter_count);
    match record.results() {
        Some(results) => print_results(&results),
        None => {
            for (i, option) in p.options.iter().enumerate() {
                println!("   {i}. {option}");
            }
        }
    }
}

fn print_results(results: &[(String, u64)]) {
    for (i, (label, count)) in results.iter().enumerate() {
        println!("   {i}. {label} => {count}");
    }
}

type Service = PredictionService<RpcLedger, ConfiguredEncryptor, RevealedTallies>;

fn connect(config: &Config) -> anyhow::Result<Service> {
    let ledger = RpcLedger::connect(config)
        .with_context(|| format!("connecting to {}", config.rpc_url))?;
    let encryptor = config
        .encryptor
        .as_deref()
        .map(CommandEncryptor::from_command_line)
        .transpose()
        .context("reading the encryptor command")?;
    Ok(PredictionService::new(
        ledger,
        ConfiguredEncryptor(encryptor),
        RevealedTallies,
    ))
}

fn run(service: &Service, config: &Config, command: Command) -> prediction_client::Result<()> {
    let action = command.action();

    match command {
        Command::Address => {
            let ledger = service.ledger();
            println!("signer:  {}", service.sync().viewer().unwrap_or_default());
            println!("program: {}", config.program_id);
            println!("ledger:  {}", ledger.ledger_address());
        }
        Command::Init => {
            let signature = service.ledger().initialize_ledger()?;
            println!("Ledger initialized in {signature}");
        }
        Command::Create { title, options } => {
            let id = service.create(&title, &options)?;
            println!("{} Id: {id}", action.success_message());
        }
        Command::Vote { id, choice } => {
            service.vote(id, choice)?;
            println!("{}", action.success_message());
        }
        Command::Close { id } => {
            service.close(id)?;
            println!("{}", action.success_message());
        }
        Command::Decrypt { id } => {
            let results = service.decrypt(id)?;
            println!("{}", action.success_message());
            print_results(&results);
        }
        Command::Retry { id } => {
            service.retry(id)?;
            println!("{}", action.success_message());
        }
        Command::List => {
            service.sync().refresh()?;
            let records = service.sync().snapshot();
            if records.is_empty() {
                println!("No predictions yet.");
            }
            records.iter().for_each(print_record);
        }
        Command::Watch => {
            let interval = config.refresh_interval();
            info!(
                "watching {} predictions every {}s",
                service.ledger().prediction_count()?,
                interval.as_secs()
            );
            loop {
                // A failed tick keeps the last snapshot; the next tick retries.
                match service.sync().refresh() {
                    Ok(RefreshOutcome::Applied { .. }) => {
                        println!("--");
                        service.sync().snapshot().iter().for_each(print_record);
                    }
                    Ok(RefreshOutcome::Stale) => {}
                    Err(e) => error!("{}", action.failure_message(&e)),
                }
                thread::sleep(interval);
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let service = connect(&cli.config)?;
    let action = cli.command.action();

    Ok(match run(&service, &cli.config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", action.failure_message(&e));
            ExitCode::FAILURE
        }
    })
}

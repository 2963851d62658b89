use std::{fs::File, path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::{Parser, Subcommand};

use wallet_ledger::config::{self, LedgerConfig};
use wallet_ledger::domain::Actor;
use wallet_ledger::jobs::{Job, JobRunner, SnapshotIntegrityAuditJob};
use wallet_ledger::ledger::Ledger;
use wallet_ledger::{output, parsing};

fn main() -> anyhow::Result<ExitCode> {
    let args = Arguments::parse();
    if let Some(log_level) = args.log_level {
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => LedgerConfig::default(),
    };
    let mut ledger = Ledger::with_config(config);

    match args.command {
        Command::Process { input_file } => {
            let file = File::open(&input_file)
                .with_context(|| format!("Failed to open {}", input_file.display()))?;
            let mut rdr = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(file);

            let commands = parsing::deserialize_csv(&mut rdr);
            ledger.process_commands(commands, Actor::System);

            output::print_wallets(ledger.wallets(), std::io::stdout())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::AuditSnapshots { snapshots_file } => {
            let file = File::open(&snapshots_file)
                .with_context(|| format!("Failed to open {}", snapshots_file.display()))?;
            let snapshots = parsing::deserialize_snapshots(file)
                .with_context(|| format!("Failed to parse {}", snapshots_file.display()))?;
            ledger.load_disclosures(snapshots);

            let job = SnapshotIntegrityAuditJob::new(ledger.config());
            let run = JobRunner::new().run(&job, &mut ledger);
            let outcome = run
                .result
                .with_context(|| format!("Job {} failed", job.name()))?;
            tracing::info!(?outcome, "Snapshot audit finished");

            output::print_report(outcome.report(), std::io::stdout())?;
            Ok(if outcome.is_all_clear() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

#[derive(Parser)]
struct Arguments {
    #[command(subcommand)]
    command: Command,
    /// Enables logging to stderr at this level.
    #[arg(long, global = true)]
    log_level: Option<tracing::Level>,
    /// TOML file with ledger settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Applies wallet commands from a CSV file and prints the resulting wallets.
    Process { input_file: PathBuf },
    /// Verifies the hashes of persisted disclosure snapshots.
    AuditSnapshots { snapshots_file: PathBuf },
}

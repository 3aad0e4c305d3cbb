//! tally CLI - team-driven cost-center synchronization
//!
//! Subcommands:
//! - `sync`: reconcile cost-center membership with team membership
//!   (plan or apply)
//! - `report`: summarize the desired assignment state without mutating
//!   anything

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod settings;

use error::CliResult;

/// tally - cost-center assignment from team membership
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = "tally.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile cost-center membership with team membership
    Sync(commands::sync::SyncArgs),

    /// Summarize the desired assignment state
    Report(commands::report::ReportArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result: CliResult<()> = match cli.command {
        Commands::Sync(args) => commands::sync::execute(&cli.config, args).await,
        Commands::Report(args) => commands::report::execute(&cli.config, args).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        std::process::exit(1);
    }
}

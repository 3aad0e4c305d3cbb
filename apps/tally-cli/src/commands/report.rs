//! Report command - summarize the desired assignment state.

use clap::Args;
use tracing::info;

use tally_engine::{SyncRun, SyncSummary};
use tally_github::GithubClient;

use crate::error::CliResult;
use crate::settings::{load_config, resolve_token};

/// Arguments for the report command.
#[derive(Args)]
pub struct ReportArgs {
    /// Output as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Execute the report command.
pub async fn execute(config_path: &str, args: ReportArgs) -> CliResult<()> {
    let config = load_config(config_path)?;
    let token = resolve_token()?;
    let client = GithubClient::new(&config.api_base_url, &config.enterprise, token)?;

    let run = SyncRun::new(&config, &client, &client, &client);
    let state = run.desired_state().await?;
    let summary = SyncSummary::new(&config, &state);

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary)
                .map_err(|e| crate::error::CliError::Config(e.to_string()))?
        );
    } else {
        println!("\n{}", summary.render());
    }

    info!("report command completed");
    Ok(())
}

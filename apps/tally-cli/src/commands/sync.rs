//! Sync command - reconcile cost-center membership with team membership.

use std::io::{self, BufRead, Write};

use clap::{Args, ValueEnum};
use tracing::{info, warn};

use tally_core::{NamingMode, RunMode, SyncConfig, TeamScope};
use tally_engine::SyncRun;
use tally_github::GithubClient;

use crate::error::CliResult;
use crate::settings::{load_config, resolve_token};

/// Arguments for the sync command.
#[derive(Args)]
pub struct SyncArgs {
    /// Execution mode: plan previews, apply pushes changes
    #[arg(long, value_enum, default_value = "plan")]
    pub mode: ModeArg,

    /// Skip the confirmation prompt in apply mode
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Create cost centers that do not exist yet
    #[arg(long)]
    pub create_cost_centers: bool,

    /// Create configured product budgets for resolved cost centers
    #[arg(long)]
    pub create_budgets: bool,

    /// Check current cost-center membership before adding users
    #[arg(long)]
    pub check_current: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Plan,
    Apply,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Plan => RunMode::Plan,
            ModeArg::Apply => RunMode::Apply,
        }
    }
}

/// Execute the sync command.
pub async fn execute(config_path: &str, args: SyncArgs) -> CliResult<()> {
    let mut config = load_config(config_path)?;

    // Flag overrides on top of the config file.
    if args.create_cost_centers {
        config.teams.auto_create_cost_centers = true;
    }
    if args.create_budgets {
        config.budgets.create = true;
    }
    if args.check_current {
        config.teams.ignore_current_cost_center = false;
    }

    let mode: RunMode = args.mode.into();
    print_config_summary(&config, mode);

    if mode.is_apply() && !args.yes && !confirm_apply(&config)? {
        warn!("aborted by user before applying assignments");
        return Ok(());
    }

    let token = resolve_token()?;
    let client = GithubClient::new(&config.api_base_url, &config.enterprise, token)?;

    let run = SyncRun::new(&config, &client, &client, &client);
    let report = run.execute(mode).await?;

    match mode {
        RunMode::Plan => {
            info!("plan complete (no changes were made)");
            for (cost_center, users) in &report.planned {
                info!(cost_center = %cost_center, users, "would assign");
            }
        }
        RunMode::Apply => {
            report.log_results();
        }
    }

    info!("sync command completed");
    Ok(())
}

/// Displays the effective configuration before a run.
fn print_config_summary(config: &SyncConfig, mode: RunMode) {
    println!("\n===== Teams Mode Configuration =====");
    println!("Run mode: {mode:?}");
    println!("Scope: {:?}", config.teams.scope);
    println!("Mode: {:?}", config.teams.mode);

    match config.teams.scope {
        TeamScope::Enterprise => println!("Enterprise: {}", config.enterprise),
        TeamScope::Organization => {
            println!("Organizations: {}", config.teams.organizations.join(", "));
        }
    }

    println!(
        "Auto-create cost centers: {}",
        config.teams.auto_create_cost_centers
    );
    println!(
        "Full sync (remove users who left teams): {}",
        config.teams.remove_users_no_longer_in_teams
    );
    println!(
        "Check current cost center: {}",
        !config.teams.ignore_current_cost_center
    );
    println!("Create budgets: {}", config.budgets.create);

    match config.teams.mode {
        NamingMode::Auto => match config.teams.scope {
            TeamScope::Enterprise => {
                println!("Cost center naming: [enterprise team] {{team-name}}");
            }
            TeamScope::Organization => {
                println!("Cost center naming: [org team] {{org-name}}/{{team-name}}");
            }
        },
        NamingMode::Manual => {
            println!("Manual mappings configured: {}", config.teams.mappings.len());
            let mut mappings: Vec<_> = config.teams.mappings.iter().collect();
            mappings.sort();
            for (team_key, cost_center) in mappings {
                println!("  - {team_key} -> {cost_center}");
            }
        }
    }
    println!("===== End of Configuration =====");
}

/// Prompts for confirmation; returns true only when the user types `apply`.
fn confirm_apply(config: &SyncConfig) -> CliResult<bool> {
    println!("\nYou are about to APPLY cost center assignments.");
    println!("This will push assignments for ALL processed users.");
    if config.teams.remove_users_no_longer_in_teams {
        println!("Full sync is ENABLED: users who left their teams will be REMOVED.");
    }
    if !config.teams.ignore_current_cost_center {
        println!("Users already in another cost center will be SKIPPED.");
    }

    print!("\nProceed? Type 'apply' to continue: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("apply"))
}

//! Run reporting: the teams summary and per-run outcome aggregation.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use tracing::{error, info, warn};

use tally_core::{BudgetOutcome, NamingMode, RunMode, SyncConfig, TeamScope};

use crate::builder::DesiredState;
use crate::drift::DriftReport;
use crate::syncer::SyncOutcome;

/// Teams-mode summary statistics for the `report` command.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub scope: TeamScope,
    pub mode: NamingMode,
    pub enterprise: String,
    pub organizations: Vec<String>,
    pub total_teams: usize,
    pub total_cost_centers: usize,
    pub unique_users: usize,
    /// Cost-center name → user count, sorted by name.
    pub cost_centers: BTreeMap<String, usize>,
}

impl SyncSummary {
    #[must_use]
    pub fn new(config: &SyncConfig, state: &DesiredState) -> Self {
        let cost_centers: BTreeMap<String, usize> = state
            .assignments
            .iter()
            .map(|(name, users)| (name.clone(), users.len()))
            .collect();

        Self {
            scope: config.teams.scope,
            mode: config.teams.mode,
            enterprise: config.enterprise.clone(),
            organizations: config.teams.organizations.clone(),
            total_teams: state.total_teams,
            total_cost_centers: state.assignments.len(),
            unique_users: state.unique_users(),
            cost_centers,
        }
    }

    /// Renders the summary as the text block the CLI prints.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Teams Cost Center Summary ===");
        let _ = writeln!(out, "Scope: {:?}", self.scope);
        let _ = writeln!(out, "Mode: {:?}", self.mode);
        match self.scope {
            TeamScope::Enterprise => {
                let _ = writeln!(out, "Enterprise: {}", self.enterprise);
            }
            TeamScope::Organization => {
                let _ = writeln!(out, "Organizations: {}", self.organizations.join(", "));
            }
        }
        let _ = writeln!(out, "Total teams: {}", self.total_teams);
        let _ = writeln!(out, "Cost centers: {}", self.total_cost_centers);
        let _ = writeln!(out, "Unique users: {}", self.unique_users);
        let _ = writeln!(out, "Note: each user is assigned to exactly ONE cost center");

        if !self.cost_centers.is_empty() {
            let _ = writeln!(out, "\nPer-Cost-Center Breakdown:");
            for (name, count) in &self.cost_centers {
                let _ = writeln!(out, "  {name}: {count} users");
            }
        }
        out
    }
}

/// Everything a finished run reports back.
#[derive(Debug, Default)]
pub struct RunReport {
    pub mode: Option<RunMode>,
    /// Plan mode: cost-center name → user count that apply would push.
    pub planned: BTreeMap<String, usize>,
    /// Apply mode: per-user outcomes keyed by cost-center id, additions and
    /// drift removals merged.
    pub results: SyncOutcome,
    /// Cost-center names that failed id resolution, with the cause.
    pub unresolved: Vec<(String, String)>,
    /// Budget provisioning outcomes per cost-center name.
    pub budgets: BTreeMap<String, Vec<(String, BudgetOutcome)>>,
    /// Stale users found / removed by the drift pass.
    pub drift_found: usize,
    pub drift_removed: usize,
}

impl RunReport {
    #[must_use]
    pub fn for_mode(mode: RunMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    /// Folds drift removal outcomes into the per-user result map.
    pub fn merge_drift(&mut self, drift: &DriftReport) {
        self.drift_found = drift.total_found;
        self.drift_removed = drift.total_removed;
        for (cc_id, outcomes) in &drift.removals {
            let entry = self.results.entry(cc_id.clone()).or_default();
            for (user, ok) in outcomes {
                entry.insert(user.clone(), *ok);
            }
        }
    }

    /// (attempted, successful, failed) across all cost centers.
    #[must_use]
    pub fn totals(&self) -> (usize, usize, usize) {
        let mut attempted = 0;
        let mut successful = 0;
        for outcome in self.results.values() {
            attempted += outcome.len();
            successful += outcome.values().filter(|ok| **ok).count();
        }
        (attempted, successful, attempted - successful)
    }

    /// Logs per-cost-center and overall success/failure counts.
    pub fn log_results(&self) {
        for (cc_id, outcome) in &self.results {
            let successful = outcome.values().filter(|ok| **ok).count();
            let failed = outcome.len() - successful;

            if failed > 0 {
                warn!(
                    cost_center_id = %cc_id,
                    successful,
                    total = outcome.len(),
                    "cost center partial success"
                );
                let failed_users: Vec<&str> = outcome
                    .iter()
                    .filter(|(_, ok)| !**ok)
                    .map(|(user, _)| user.as_str())
                    .collect();
                error!(
                    cost_center_id = %cc_id,
                    users = %failed_users.join(", "),
                    "failed users"
                );
            } else {
                info!(cost_center_id = %cc_id, count = successful, "cost center all successful");
            }
        }

        for (name, cause) in &self.unresolved {
            error!(cost_center = %name, cause = %cause, "cost center could not be resolved");
        }

        let (attempted, successful, failed) = self.totals();
        if failed > 0 {
            warn!(successful, total = attempted, failed, "final result");
        } else {
            info!(count = successful, "final result: all users successfully assigned");
        }
    }
}

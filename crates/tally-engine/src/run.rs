//! Plan/apply orchestration for one sync run.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{info, warn};

use tally_core::{BudgetStore, CostCenterStore, RunMode, SyncConfig, TeamDirectory};

use crate::budgets::BudgetManager;
use crate::builder::{DesiredState, DesiredStateBuilder};
use crate::drift::DriftRemover;
use crate::error::{SyncError, SyncResult};
use crate::ids::{IdResolution, IdResolver};
use crate::report::RunReport;
use crate::syncer::AssignmentSyncer;

/// One reconciliation run against a directory, a cost-center store, and a
/// budget store.
///
/// Constructed fresh per run; all run-scoped caches live in the phases it
/// drives, so nothing leaks between runs.
pub struct SyncRun<'a, D, S, B>
where
    D: TeamDirectory,
    S: CostCenterStore,
    B: BudgetStore,
{
    config: &'a SyncConfig,
    directory: &'a D,
    store: &'a S,
    budgets: &'a B,
}

impl<'a, D, S, B> SyncRun<'a, D, S, B>
where
    D: TeamDirectory,
    S: CostCenterStore,
    B: BudgetStore,
{
    #[must_use]
    pub fn new(config: &'a SyncConfig, directory: &'a D, store: &'a S, budgets: &'a B) -> Self {
        Self {
            config,
            directory,
            store,
            budgets,
        }
    }

    /// Builds the desired state only. Used by the report command.
    pub async fn desired_state(&self) -> SyncResult<DesiredState> {
        self.config
            .validate()
            .map_err(|e| SyncError::Config(e.to_string()))?;
        DesiredStateBuilder::new(self.config, self.directory)
            .build()
            .await
    }

    /// Executes a full run.
    ///
    /// Plan mode stops after the desired state is computed and reports what
    /// apply would push, touching nothing remote beyond the directory
    /// reads. Apply mode resolves ids, provisions budgets, syncs
    /// additions, and runs the drift pass.
    pub async fn execute(&self, mode: RunMode) -> SyncResult<RunReport> {
        let state = self.desired_state().await?;

        let mut report = RunReport::for_mode(mode);
        if state.is_empty() {
            warn!("no team assignments to sync");
            return Ok(report);
        }

        if !mode.is_apply() {
            return Ok(self.plan(&state, report));
        }

        // Resolve cost-center names to ids.
        let names = state.cost_center_names();
        let resolution = if self.config.teams.auto_create_cost_centers {
            IdResolver::new(self.store).resolve(&names).await
        } else {
            info!("auto-creation disabled, assuming cost center ids are valid");
            IdResolution {
                ids: names.iter().map(|n| (n.clone(), n.clone())).collect(),
                ..IdResolution::default()
            }
        };
        report.unresolved = resolution
            .failures
            .iter()
            .map(|(name, cause)| (name.clone(), cause.to_string()))
            .collect();

        // Budgets for every resolved cost center, preload hits included.
        if self.config.budgets.create {
            let mut manager = BudgetManager::new(self.budgets, &self.config.budgets.products);
            let mut resolved: Vec<(&String, &String)> = resolution.ids.iter().collect();
            resolved.sort();
            for (name, id) in resolved {
                if !manager.is_available() {
                    break;
                }
                let outcomes = manager.ensure_for_cost_center(id, name).await;
                if !outcomes.is_empty() {
                    report.budgets.insert(name.clone(), outcomes);
                }
            }
        }

        // Desired state keyed by id, deduplicated.
        let desired = desired_by_id(&state, &resolution.ids);
        let total_users: usize = desired.values().map(BTreeSet::len).sum();
        info!(
            cost_centers = desired.len(),
            total_users, "prepared assignments"
        );

        info!("syncing team-based assignments");
        report.results = AssignmentSyncer::new(self.store)
            .sync(&desired, self.config.teams.ignore_current_cost_center)
            .await;

        // Drift detection always runs in apply mode; removal is gated by
        // policy.
        info!("checking for users no longer in teams");
        let id_to_name: HashMap<String, String> = resolution
            .ids
            .iter()
            .map(|(name, id)| (id.clone(), name.clone()))
            .collect();
        let drift = DriftRemover::new(self.store)
            .remove_drift(
                &desired,
                &resolution.newly_created,
                &id_to_name,
                self.config.teams.remove_users_no_longer_in_teams,
            )
            .await;
        report.merge_drift(&drift);

        Ok(report)
    }

    fn plan(&self, state: &DesiredState, mut report: RunReport) -> RunReport {
        info!(
            count = state.assignments.len(),
            "plan mode: would ensure cost centers exist"
        );

        for (name, assignments) in &state.assignments {
            let users: BTreeSet<&str> = assignments
                .iter()
                .map(|a| a.username.as_str())
                .collect();
            info!(cost_center = %name, users = users.len(), "would assign");
            report.planned.insert(name.clone(), users.len());
        }

        if self.config.teams.remove_users_no_longer_in_teams {
            info!("full sync mode is enabled: apply would remove users no longer in teams");
        }

        report
    }
}

/// Converts name-keyed assignments to id-keyed deduplicated user sets,
/// dropping cost centers whose name never resolved.
fn desired_by_id(
    state: &DesiredState,
    ids: &HashMap<String, String>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut desired: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (name, assignments) in &state.assignments {
        let Some(id) = ids.get(name) else {
            continue;
        };
        let users = desired.entry(id.clone()).or_default();
        for assignment in assignments {
            users.insert(assignment.username.clone());
        }
    }
    desired
}

//! Detects and removes cost-center members who left their team.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{error, info, warn};

use tally_core::CostCenterStore;

/// What a drift pass found and did.
#[derive(Debug, Default)]
pub struct DriftReport {
    /// Cost-center id → stale usernames detected (sorted).
    pub detected: BTreeMap<String, Vec<String>>,
    /// Per-user removal outcomes. Empty unless removal was applied.
    pub removals: BTreeMap<String, BTreeMap<String, bool>>,
    /// Cost centers skipped because they were created this run.
    pub skipped_new: usize,
    /// Total stale users found across all cost centers.
    pub total_found: usize,
    /// Total users successfully removed.
    pub total_removed: usize,
}

/// Diffs remote membership against the expected sets and removes the
/// difference when asked to.
pub struct DriftRemover<'a, S: CostCenterStore> {
    store: &'a S,
}

impl<'a, S: CostCenterStore> DriftRemover<'a, S> {
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// For every cost center not created this run, fetch membership and
    /// compute `current − expected`. Detection always runs and is logged;
    /// removal (one batch call per cost center) only happens with `apply`.
    ///
    /// `id_to_name` is used for display names in logs only.
    pub async fn remove_drift(
        &self,
        expected: &BTreeMap<String, BTreeSet<String>>,
        newly_created: &HashSet<String>,
        id_to_name: &HashMap<String, String>,
        apply: bool,
    ) -> DriftReport {
        let mut report = DriftReport::default();

        // A cost center created this run had no members before it; nothing
        // can have drifted.
        report.skipped_new = expected
            .keys()
            .filter(|id| newly_created.contains(*id))
            .count();
        if report.skipped_new > 0 {
            info!(
                skipped = report.skipped_new,
                "skipping newly created cost centers (no stale members possible)"
            );
        }

        info!(
            count = expected.len() - report.skipped_new,
            "checking cost centers for users no longer in teams"
        );

        for (cc_id, expected_users) in expected {
            if newly_created.contains(cc_id) {
                continue;
            }

            let current = match self.store.cost_center_members(cc_id).await {
                Ok(members) => members,
                Err(e) => {
                    error!(cost_center_id = %cc_id, error = %e, "failed to get cost center members");
                    continue;
                }
            };

            let mut stale: Vec<String> = current
                .into_iter()
                .filter(|member| !expected_users.contains(member))
                .collect();
            if stale.is_empty() {
                continue;
            }
            stale.sort();

            let display_name = id_to_name.get(cc_id).map_or(cc_id.as_str(), String::as_str);
            report.total_found += stale.len();
            warn!(
                cost_center = %display_name,
                count = stale.len(),
                "users no longer in team for cost center"
            );
            for user in &stale {
                warn!(user = %user, cost_center = %display_name, "user no longer in team");
            }

            if apply {
                info!(
                    cost_center = %display_name,
                    count = stale.len(),
                    "removing users no longer in team"
                );
                let outcome: BTreeMap<String, bool> =
                    match self.store.remove_users(cc_id, &stale).await {
                        Ok(()) => stale.iter().map(|u| (u.clone(), true)).collect(),
                        Err(e) => {
                            error!(cost_center = %display_name, error = %e, "failed to remove users");
                            stale.iter().map(|u| (u.clone(), false)).collect()
                        }
                    };
                report.total_removed += outcome.values().filter(|ok| **ok).count();
                report.removals.insert(cc_id.clone(), outcome);
            } else {
                info!(
                    cost_center = %display_name,
                    "full sync disabled, users will remain in cost center"
                );
            }

            report.detected.insert(cc_id.clone(), stale);
        }

        if report.total_found > 0 {
            if apply {
                info!(
                    found = report.total_found,
                    removed = report.total_removed,
                    "user removal summary"
                );
            } else {
                warn!(
                    count = report.total_found,
                    "users no longer in teams (not removed, full sync disabled)"
                );
            }
        } else {
            info!("all cost centers are in sync with teams, no stale members found");
        }

        report
    }
}

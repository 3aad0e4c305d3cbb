//! Converges cost-center membership toward the desired state (additions).

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, error, info};

use tally_core::CostCenterStore;

use crate::error::SyncResult;

/// Hard remote limit on users per add request.
pub(crate) const MAX_BATCH_SIZE: usize = 50;

/// Per-user outcome maps, keyed by cost-center id.
pub type SyncOutcome = BTreeMap<String, BTreeMap<String, bool>>;

/// Adds desired users to their cost centers, batching ≤50 per request.
pub struct AssignmentSyncer<'a, S: CostCenterStore> {
    store: &'a S,
}

impl<'a, S: CostCenterStore> AssignmentSyncer<'a, S> {
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Processes every cost center, returning a complete per-user outcome
    /// map: users already in place are `true` without any call, users
    /// skipped for sitting in a different cost center are `false`, and
    /// batched additions record the batch result.
    ///
    /// A failure against one cost center (even fetching its membership)
    /// marks that cost center's users `false` and moves on.
    pub async fn sync(
        &self,
        desired: &BTreeMap<String, BTreeSet<String>>,
        ignore_current_cost_center: bool,
    ) -> SyncOutcome {
        let mut results = SyncOutcome::new();

        for (cc_id, usernames) in desired {
            if usernames.is_empty() {
                continue;
            }

            let outcome = match self
                .sync_cost_center(cc_id, usernames, ignore_current_cost_center)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(cost_center_id = %cc_id, error = %e, "failed to update cost center assignments");
                    usernames.iter().map(|u| (u.clone(), false)).collect()
                }
            };
            results.insert(cc_id.clone(), outcome);
        }

        let mut successful = 0usize;
        let mut failed = 0usize;
        for outcome in results.values() {
            for ok in outcome.values() {
                if *ok {
                    successful += 1;
                } else {
                    failed += 1;
                }
            }
        }
        info!(successful, total = successful + failed, "assignment results");
        if failed > 0 {
            error!(failed, "some users failed assignment");
        }

        results
    }

    async fn sync_cost_center(
        &self,
        cc_id: &str,
        usernames: &BTreeSet<String>,
        ignore_current_cost_center: bool,
    ) -> SyncResult<BTreeMap<String, bool>> {
        let mut results = BTreeMap::new();

        // One membership fetch decides who is already in place.
        let current: HashSet<String> = self
            .store
            .cost_center_members(cc_id)
            .await?
            .into_iter()
            .collect();

        let mut to_add = Vec::new();
        for username in usernames {
            if current.contains(username) {
                results.insert(username.clone(), true);
                continue;
            }

            if !ignore_current_cost_center {
                // The one place a per-user call is unavoidable: is the user
                // already somewhere else?
                match self.store.user_cost_center(username).await {
                    Ok(Some(membership)) if membership.id != cc_id => {
                        info!(
                            user = %username,
                            current_cost_center = %membership.name,
                            "skipping user already in another cost center"
                        );
                        results.insert(username.clone(), false);
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!(user = %username, error = %e, "membership lookup failed, treating as unassigned");
                    }
                }
            }

            to_add.push(username.clone());
        }

        if to_add.is_empty() {
            info!(cost_center_id = %cc_id, "all users already assigned");
            return Ok(results);
        }

        info!(
            cost_center_id = %cc_id,
            to_add = to_add.len(),
            already_assigned = usernames.len() - to_add.len(),
            "adding users to cost center"
        );

        for batch in to_add.chunks(MAX_BATCH_SIZE) {
            match self.store.add_users(cc_id, batch).await {
                Ok(()) => {
                    info!(cost_center_id = %cc_id, batch_size = batch.len(), "added users batch");
                    for username in batch {
                        results.insert(username.clone(), true);
                    }
                }
                Err(e) => {
                    error!(
                        cost_center_id = %cc_id,
                        batch_size = batch.len(),
                        error = %e,
                        "failed to add users batch"
                    );
                    for username in batch {
                        results.insert(username.clone(), false);
                    }
                }
            }
        }

        Ok(results)
    }
}

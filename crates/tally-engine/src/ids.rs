//! Cost-center name → id resolution.
//!
//! Two-phase strategy to keep network round-trips low: one bulk listing of
//! active cost centers resolves most names for free, and only the misses
//! fall back to a create-or-find call each.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use tally_core::{ApiError, CostCenterStore};

use crate::error::{SyncError, SyncResult};

/// Extracts the winning UUID from a create-conflict error body.
///
/// The remote's 409 message for an existing name may read
/// `"... existing cost center UUID: <uuid> ..."`.
static CONFLICT_UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)existing cost center UUID:\s*([a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12})",
    )
    .expect("CONFLICT_UUID_RE is a valid regex pattern")
});

/// Pulls the embedded cost-center UUID out of a 409 response body, if the
/// message carries one.
pub(crate) fn extract_conflict_uuid(body: &str) -> Option<String> {
    let id = CONFLICT_UUID_RE.captures(body)?.get(1)?.as_str();
    // The pattern is shape-correct already; parsing guards against
    // malformed variants slipping through.
    Uuid::parse_str(id).ok()?;
    Some(id.to_string())
}

/// Outcome of resolving a batch of cost-center names.
#[derive(Debug, Default)]
pub struct IdResolution {
    /// name → id for every name that resolved.
    pub ids: HashMap<String, String>,
    /// Ids created fresh during this resolution. The drift remover skips
    /// these: a brand-new cost center cannot have stale members.
    pub newly_created: HashSet<String>,
    /// Names that could not be resolved, with the terminal cause.
    pub failures: Vec<(String, SyncError)>,
    /// Names satisfied by the preload listing.
    pub preload_hits: usize,
    /// Names that needed a create-or-find call.
    pub api_calls: usize,
}

/// Resolves cost-center names to ids against a [`CostCenterStore`].
pub struct IdResolver<'a, S: CostCenterStore> {
    store: &'a S,
}

impl<'a, S: CostCenterStore> IdResolver<'a, S> {
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolves every name, creating missing cost centers.
    ///
    /// A name that fails to resolve is recorded in
    /// [`IdResolution::failures`] and does not affect the other names.
    pub async fn resolve(&self, names: &[String]) -> IdResolution {
        info!(count = names.len(), "ensuring cost centers exist");

        // Preload active cost centers; on failure fall back to individual
        // creation with an empty map.
        let mut active = match self.store.list_active_cost_centers().await {
            Ok(map) => {
                info!(count = map.len(), "preloaded active cost centers");
                map
            }
            Err(e) => {
                warn!(error = %e, "failed to preload cost centers, falling back to individual creation");
                HashMap::new()
            }
        };

        let mut resolution = IdResolution::default();

        for name in names {
            if let Some(id) = active.get(name) {
                debug!(name = %name, id = %id, "preload hit");
                resolution.ids.insert(name.clone(), id.clone());
                resolution.preload_hits += 1;
                continue;
            }

            resolution.api_calls += 1;
            match self.create_or_find(name).await {
                Ok(CreateOrFind { id, created }) => {
                    if created {
                        resolution.newly_created.insert(id.clone());
                        debug!(name = %name, id = %id, "created cost center");
                    }
                    // Later names in the same batch hit the map instead of
                    // re-creating.
                    active.insert(name.clone(), id.clone());
                    resolution.ids.insert(name.clone(), id);
                }
                Err(e) => {
                    error!(name = %name, error = %e, "failed to create or find cost center");
                    resolution.failures.push((name.clone(), e));
                }
            }
        }

        let total = resolution.preload_hits + resolution.api_calls;
        let hit_rate = if total > 0 {
            resolution.preload_hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        info!(
            resolved = resolution.ids.len(),
            preload_hits = resolution.preload_hits,
            api_calls = resolution.api_calls,
            hit_rate_pct = format!("{hit_rate:.1}"),
            "cost center resolution complete"
        );

        resolution
    }

    /// Create a cost center, resolving a name collision to the existing id.
    ///
    /// A collision can also be a race: another actor creating the same name
    /// between the preload and this call lands here and resolves the same
    /// way. The 409 body is tried first; only when it carries no UUID does
    /// the fallback name search run. A name whose only cost center is
    /// deleted fails terminally.
    async fn create_or_find(&self, name: &str) -> SyncResult<CreateOrFind> {
        let err = match self.store.create_cost_center(name).await {
            Ok(id) => return Ok(CreateOrFind { id, created: true }),
            Err(err) => err,
        };

        if !err.is_conflict() {
            return Err(err.into());
        }

        info!(name = %name, "cost center already exists, extracting existing id");
        if let ApiError::Api { body, .. } = &err {
            if let Some(id) = extract_conflict_uuid(body) {
                info!(name = %name, id = %id, "extracted existing cost center id from conflict response");
                return Ok(CreateOrFind { id, created: false });
            }
        }

        warn!(name = %name, "could not extract UUID from conflict response, falling back to name search");
        match self.store.find_cost_center_by_name(name).await? {
            Some(cc) if cc.is_active() => {
                info!(name = %name, id = %cc.id, "found active cost center by name");
                Ok(CreateOrFind {
                    id: cc.id,
                    created: false,
                })
            }
            Some(cc) => {
                error!(
                    name = %name,
                    id = %cc.id,
                    state = %cc.state,
                    "cost center exists but is deleted; recreate or reactivate it out of band"
                );
                Err(SyncError::CostCenterInactive {
                    name: name.to_string(),
                    state: cc.state,
                })
            }
            None => Err(SyncError::CostCenterNotFound {
                name: name.to_string(),
            }),
        }
    }
}

struct CreateOrFind {
    id: String,
    created: bool,
}

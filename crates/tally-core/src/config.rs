//! Typed configuration surface for a sync run.
//!
//! Scope, naming mode, and run mode are closed enums: a config file with an
//! unknown value fails deserialization up front instead of being silently
//! defaulted at resolution time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::types::TeamSource;

/// Which level of the platform teams are enumerated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamScope {
    Enterprise,
    Organization,
}

/// How a team maps to a cost-center name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingMode {
    /// Deterministic templated names derived from the team.
    Auto,
    /// Explicit team-key → cost-center-name table; unmapped teams are
    /// skipped.
    Manual,
}

/// Whether a run previews or applies changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Compute the desired state and report; no remote mutation.
    Plan,
    /// Converge the remote store toward the desired state.
    Apply,
}

impl RunMode {
    #[must_use]
    pub fn is_apply(self) -> bool {
        matches!(self, RunMode::Apply)
    }
}

/// Per-product budget settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductBudget {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Budget amount in dollars.
    pub amount: u64,
}

/// Teams-mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamsConfig {
    pub scope: TeamScope,
    pub mode: NamingMode,
    /// Organizations to enumerate when `scope = "organization"`.
    #[serde(default)]
    pub organizations: Vec<String>,
    /// Manual team-key → cost-center-name table.
    #[serde(default)]
    pub mappings: HashMap<String, String>,
    /// Create missing cost centers instead of assuming names are valid ids.
    #[serde(default = "default_true")]
    pub auto_create_cost_centers: bool,
    /// Remove cost-center members who are no longer in the backing team.
    #[serde(default)]
    pub remove_users_no_longer_in_teams: bool,
    /// Skip the per-user current-membership lookup before adding.
    #[serde(default = "default_true")]
    pub ignore_current_cost_center: bool,
}

/// Budget provisioning settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetsConfig {
    /// Master switch; individual products can still be disabled.
    #[serde(default)]
    pub create: bool,
    /// Product SKU → budget settings.
    #[serde(default)]
    pub products: HashMap<String, ProductBudget>,
}

/// Full configuration for a sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Enterprise slug all billing endpoints are scoped to.
    pub enterprise: String,
    /// REST API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    pub teams: TeamsConfig,
    #[serde(default)]
    pub budgets: BudgetsConfig,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_true() -> bool {
    true
}

impl SyncConfig {
    /// Check invariants that serde cannot express.
    ///
    /// An empty enterprise slug is fatal (every billing endpoint needs it).
    /// An organization scope without organizations, or a manual mode without
    /// mappings, yields an empty sync; both are warned about but allowed,
    /// so a partially filled-in config can still be exercised.
    pub fn validate(&self) -> ApiResult<()> {
        if self.enterprise.trim().is_empty() {
            return Err(ApiError::Config(
                "enterprise slug is required".to_string(),
            ));
        }

        if self.teams.scope == TeamScope::Organization && self.teams.organizations.is_empty() {
            warn!("no organizations configured for organization scope");
        }
        if self.teams.mode == NamingMode::Manual && self.teams.mappings.is_empty() {
            warn!("manual mode configured without any team mappings");
        }

        Ok(())
    }

    /// The team sources a run enumerates, in configured order.
    #[must_use]
    pub fn team_sources(&self) -> Vec<TeamSource> {
        match self.teams.scope {
            TeamScope::Enterprise => vec![TeamSource::Enterprise(self.enterprise.clone())],
            TeamScope::Organization => self
                .teams
                .organizations
                .iter()
                .map(|org| TeamSource::Organization(org.clone()))
                .collect(),
        }
    }
}

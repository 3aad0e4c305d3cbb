//! Domain types exchanged between the directory/billing client and the
//! reconciliation engine.

use serde::{Deserialize, Serialize};

/// A team fetched from the remote directory.
///
/// Ephemeral: fetched per sync run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Display name, used for auto-generated cost-center names.
    pub name: String,
    /// URL slug, used for API calls and team keys.
    pub slug: String,
}

/// Where teams are enumerated from: a whole enterprise or a single
/// organization.
///
/// Each variant knows how to derive the team key used for caching and for
/// manual mapping lookups: enterprise teams are keyed by bare slug,
/// organization teams by `org/slug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamSource {
    /// Enterprise-level teams, identified by the enterprise slug.
    Enterprise(String),
    /// Organization-level teams, identified by the organization name.
    Organization(String),
}

impl TeamSource {
    /// The enterprise slug or organization name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            TeamSource::Enterprise(name) | TeamSource::Organization(name) => name,
        }
    }

    /// Label used in logs ("enterprise" or "organization").
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            TeamSource::Enterprise(_) => "enterprise",
            TeamSource::Organization(_) => "organization",
        }
    }

    /// The stable key identifying a team within this source.
    #[must_use]
    pub fn team_key(&self, team_slug: &str) -> String {
        match self {
            TeamSource::Enterprise(_) => team_slug.to_string(),
            TeamSource::Organization(org) => format!("{org}/{team_slug}"),
        }
    }
}

/// A billing cost center as returned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCenter {
    pub id: String,
    pub name: String,
    /// Remote lifecycle state ("active", "deleted", "REMOVED", ...).
    /// Free-form upstream; compare through [`CostCenter::is_active`].
    #[serde(default)]
    pub state: String,
}

impl CostCenter {
    /// Whether this cost center can receive assignments.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.eq_ignore_ascii_case("active")
    }
}

/// Lightweight cost-center reference inside a user membership lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCenterRef {
    pub id: String,
    pub name: String,
}

/// The cost-center assignment computed for a user from team membership.
///
/// The desired-state builder keeps exactly one of these per username
/// (last team processed wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAssignment {
    pub username: String,
    pub cost_center: String,
    /// Organization or enterprise the winning team belongs to.
    pub org: String,
    pub team_slug: String,
}

/// Outcome of ensuring a budget exists for a cost center.
///
/// `Unavailable` means the budgets endpoint responded 404; the run must not
/// attempt further budget calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetOutcome {
    Created,
    AlreadyExists,
    Failed,
    Unavailable,
}

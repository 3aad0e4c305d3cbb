//! Capability traits the reconciliation engine consumes.
//!
//! The engine never constructs URLs or touches HTTP; it sees a team
//! directory, a cost-center store, and a budget store. `tally-github`
//! implements all three against the GitHub Enterprise billing API, and the
//! engine's tests implement them in memory.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::types::{CostCenter, CostCenterRef, Team, TeamSource};

/// Paginated read access to teams and team membership.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    /// List all teams in a source, preserving the remote-defined order.
    ///
    /// Order matters: it drives the last-write-wins tie-break when a user
    /// belongs to multiple teams.
    async fn list_teams(&self, source: &TeamSource) -> ApiResult<Vec<Team>>;

    /// List the member logins of a team, deduplicated, in remote order.
    async fn list_team_members(
        &self,
        source: &TeamSource,
        team_slug: &str,
    ) -> ApiResult<Vec<String>>;
}

/// Cost-center CRUD plus membership queries.
#[async_trait]
pub trait CostCenterStore: Send + Sync {
    /// All cost centers currently in the "active" state, as name → id.
    async fn list_active_cost_centers(&self) -> ApiResult<HashMap<String, String>>;

    /// Create a cost center, returning its id.
    ///
    /// A name collision surfaces as an `ApiError::Api` with status 409; the
    /// response body may embed the existing id and is left to the caller to
    /// interpret.
    async fn create_cost_center(&self, name: &str) -> ApiResult<String>;

    /// Find a cost center by exact name, preferring an active one over a
    /// deleted one when both exist. `None` when no cost center has the name
    /// in any state.
    async fn find_cost_center_by_name(&self, name: &str) -> ApiResult<Option<CostCenter>>;

    /// Usernames currently attached to a cost center.
    async fn cost_center_members(&self, id: &str) -> ApiResult<Vec<String>>;

    /// Add up to 50 users in one call. Callers are responsible for
    /// batching; the remote rejects larger requests.
    async fn add_users(&self, id: &str, usernames: &[String]) -> ApiResult<()>;

    /// Remove users from a cost center in one call.
    async fn remove_users(&self, id: &str, usernames: &[String]) -> ApiResult<()>;

    /// The cost center a user currently belongs to, if any.
    ///
    /// Lookup failures are reported as `Ok(None)`: an unreadable membership
    /// must not block an addition.
    async fn user_cost_center(&self, username: &str) -> ApiResult<Option<CostCenterRef>>;
}

/// Spending-budget provisioning.
///
/// Budget APIs are enterprise-optional: both operations fail with
/// `ApiError::BudgetsUnavailable` when the endpoint responds 404, and
/// callers must stop calling for the rest of the run.
#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// Whether a budget already exists for the cost center and product SKU.
    ///
    /// Matches by cost-center NAME, not id: the upstream budget API records
    /// the display name even when the id was supplied at creation, so an
    /// id-based check would re-create existing budgets.
    async fn has_budget(
        &self,
        cost_center_id: &str,
        cost_center_name: &str,
        product: &str,
    ) -> ApiResult<bool>;

    /// Create a budget for a product SKU. Returns whether the remote
    /// accepted the creation.
    async fn create_budget(
        &self,
        cost_center_id: &str,
        cost_center_name: &str,
        product: &str,
        amount: u64,
    ) -> ApiResult<bool>;
}

//! In-memory collaborator doubles for engine tests.
//!
//! Every double records the calls it receives so tests can assert on call
//! counts and batch shapes, not just final state.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use tally_core::{
    ApiError, ApiResult, BudgetStore, BudgetsConfig, CostCenter, CostCenterRef, CostCenterStore,
    NamingMode, ProductBudget, SyncConfig, Team, TeamDirectory, TeamScope, TeamSource,
    TeamsConfig,
};

pub const PRODUCT: &str = "copilot_premium_request";

/// Builds a config for an organization-scoped auto-mode run over `orgs`.
pub fn org_config(orgs: &[&str]) -> SyncConfig {
    SyncConfig {
        enterprise: "test-enterprise".into(),
        api_base_url: "https://api.github.test".into(),
        teams: TeamsConfig {
            scope: TeamScope::Organization,
            mode: NamingMode::Auto,
            organizations: orgs.iter().map(ToString::to_string).collect(),
            mappings: HashMap::new(),
            auto_create_cost_centers: true,
            remove_users_no_longer_in_teams: false,
            ignore_current_cost_center: true,
        },
        budgets: BudgetsConfig::default(),
    }
}

/// Builds a config for an enterprise-scoped auto-mode run.
pub fn enterprise_config() -> SyncConfig {
    let mut config = org_config(&[]);
    config.teams.scope = TeamScope::Enterprise;
    config
}

/// Enables budget creation for the standard test product.
pub fn with_budgets(mut config: SyncConfig, amount: u64) -> SyncConfig {
    config.budgets.create = true;
    config.budgets.products.insert(
        PRODUCT.into(),
        ProductBudget {
            enabled: true,
            amount,
        },
    );
    config
}

pub fn team(name: &str, slug: &str) -> Team {
    Team {
        name: name.into(),
        slug: slug.into(),
    }
}

pub fn users(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

// ---------------------------------------------------------------------
// Directory double
// ---------------------------------------------------------------------

#[derive(Default)]
pub struct MockDirectory {
    /// Source name → teams, in enumeration order.
    pub teams: HashMap<String, Vec<Team>>,
    /// Team key → member logins.
    pub members: HashMap<String, Vec<String>>,
    /// Team keys whose member fetch fails.
    pub failing_members: HashSet<String>,
    /// Source names whose team listing fails.
    pub failing_sources: HashSet<String>,
    pub member_calls: Mutex<Vec<String>>,
}

impl MockDirectory {
    /// Registers a team under an organization source (`org/slug` member key).
    pub fn with_team(mut self, org: &str, team: Team, members: &[&str]) -> Self {
        self.members
            .insert(format!("{org}/{}", team.slug), users(members));
        self.teams.entry(org.to_string()).or_default().push(team);
        self
    }

    /// Registers a team under an enterprise source (bare-slug member key).
    pub fn with_enterprise_team(mut self, enterprise: &str, team: Team, members: &[&str]) -> Self {
        self.members.insert(team.slug.clone(), users(members));
        self.teams
            .entry(enterprise.to_string())
            .or_default()
            .push(team);
        self
    }
}

#[async_trait]
impl TeamDirectory for MockDirectory {
    async fn list_teams(&self, source: &TeamSource) -> ApiResult<Vec<Team>> {
        if self.failing_sources.contains(source.name()) {
            return Err(ApiError::Api {
                status: 500,
                body: "directory unreachable".into(),
            });
        }
        Ok(self.teams.get(source.name()).cloned().unwrap_or_default())
    }

    async fn list_team_members(
        &self,
        source: &TeamSource,
        team_slug: &str,
    ) -> ApiResult<Vec<String>> {
        let key = source.team_key(team_slug);
        self.member_calls.lock().unwrap().push(key.clone());
        if self.failing_members.contains(&key) {
            return Err(ApiError::Api {
                status: 502,
                body: "members unavailable".into(),
            });
        }
        Ok(self.members.get(&key).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------
// Cost-center store double
// ---------------------------------------------------------------------

/// What `create_cost_center` does for a given name.
#[derive(Debug, Clone)]
pub enum CreateBehavior {
    /// Succeed with this id.
    Ok(String),
    /// Respond 409 with this body.
    Conflict(String),
    /// Respond with an arbitrary terminal status.
    Error(u16, String),
}

#[derive(Default)]
pub struct MockStore {
    /// Cost centers returned by the bulk active listing (name → id).
    pub active: Mutex<HashMap<String, String>>,
    /// Everything `find_cost_center_by_name` can see.
    pub catalog: Mutex<Vec<CostCenter>>,
    /// Current membership per cost-center id.
    pub memberships: Mutex<HashMap<String, Vec<String>>>,
    /// Username → current cost center, for the per-user lookup.
    pub user_memberships: HashMap<String, CostCenterRef>,
    /// Overrides for create calls; names without an entry mint `id-{name}`.
    pub create_behavior: HashMap<String, CreateBehavior>,
    /// Fail the whole active listing.
    pub fail_listing: bool,
    /// Fail membership fetches for these ids.
    pub failing_member_fetches: HashSet<String>,
    /// Fail any add batch containing one of these usernames.
    pub failing_add_users: HashSet<String>,
    /// Fail removals for these cost-center ids.
    pub failing_removals: HashSet<String>,

    pub list_calls: Mutex<usize>,
    pub create_calls: Mutex<Vec<String>>,
    pub find_calls: Mutex<Vec<String>>,
    pub member_fetches: Mutex<Vec<String>>,
    pub add_calls: Mutex<Vec<(String, Vec<String>)>>,
    pub remove_calls: Mutex<Vec<(String, Vec<String>)>>,
    pub user_lookups: Mutex<Vec<String>>,
}

impl MockStore {
    /// Registers an active cost center visible to both the bulk listing and
    /// the name search.
    pub fn with_active(self, name: &str, id: &str) -> Self {
        self.active
            .lock()
            .unwrap()
            .insert(name.to_string(), id.to_string());
        self.catalog.lock().unwrap().push(CostCenter {
            id: id.into(),
            name: name.into(),
            state: "active".into(),
        });
        self
    }

    /// Registers a cost center only visible to the name search.
    pub fn with_catalog_entry(self, name: &str, id: &str, state: &str) -> Self {
        self.catalog.lock().unwrap().push(CostCenter {
            id: id.into(),
            name: name.into(),
            state: state.into(),
        });
        self
    }

    pub fn with_members(self, id: &str, members: &[&str]) -> Self {
        self.memberships
            .lock()
            .unwrap()
            .insert(id.to_string(), users(members));
        self
    }

    pub fn with_create(mut self, name: &str, behavior: CreateBehavior) -> Self {
        self.create_behavior.insert(name.to_string(), behavior);
        self
    }

    pub fn with_user_membership(mut self, username: &str, cc_id: &str, cc_name: &str) -> Self {
        self.user_memberships.insert(
            username.to_string(),
            CostCenterRef {
                id: cc_id.into(),
                name: cc_name.into(),
            },
        );
        self
    }

    pub fn add_call_count(&self) -> usize {
        self.add_calls.lock().unwrap().len()
    }

    pub fn add_batch_sizes(&self) -> Vec<usize> {
        self.add_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, users)| users.len())
            .collect()
    }
}

#[async_trait]
impl CostCenterStore for MockStore {
    async fn list_active_cost_centers(&self) -> ApiResult<HashMap<String, String>> {
        *self.list_calls.lock().unwrap() += 1;
        if self.fail_listing {
            return Err(ApiError::Api {
                status: 500,
                body: "listing failed".into(),
            });
        }
        Ok(self.active.lock().unwrap().clone())
    }

    async fn create_cost_center(&self, name: &str) -> ApiResult<String> {
        self.create_calls.lock().unwrap().push(name.to_string());
        match self.create_behavior.get(name) {
            Some(CreateBehavior::Ok(id)) => Ok(id.clone()),
            Some(CreateBehavior::Conflict(body)) => Err(ApiError::Api {
                status: 409,
                body: body.clone(),
            }),
            Some(CreateBehavior::Error(status, body)) => Err(ApiError::Api {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(format!("id-{name}")),
        }
    }

    async fn find_cost_center_by_name(&self, name: &str) -> ApiResult<Option<CostCenter>> {
        self.find_calls.lock().unwrap().push(name.to_string());
        let catalog = self.catalog.lock().unwrap();
        let active = catalog.iter().find(|cc| cc.name == name && cc.is_active());
        let any = catalog.iter().find(|cc| cc.name == name);
        Ok(active.or(any).cloned())
    }

    async fn cost_center_members(&self, id: &str) -> ApiResult<Vec<String>> {
        self.member_fetches.lock().unwrap().push(id.to_string());
        if self.failing_member_fetches.contains(id) {
            return Err(ApiError::Api {
                status: 500,
                body: "members fetch failed".into(),
            });
        }
        Ok(self
            .memberships
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_users(&self, id: &str, usernames: &[String]) -> ApiResult<()> {
        self.add_calls
            .lock()
            .unwrap()
            .push((id.to_string(), usernames.to_vec()));
        if usernames.iter().any(|u| self.failing_add_users.contains(u)) {
            return Err(ApiError::Api {
                status: 422,
                body: "add rejected".into(),
            });
        }
        let mut memberships = self.memberships.lock().unwrap();
        let members = memberships.entry(id.to_string()).or_default();
        for username in usernames {
            if !members.contains(username) {
                members.push(username.clone());
            }
        }
        Ok(())
    }

    async fn remove_users(&self, id: &str, usernames: &[String]) -> ApiResult<()> {
        self.remove_calls
            .lock()
            .unwrap()
            .push((id.to_string(), usernames.to_vec()));
        if self.failing_removals.contains(id) {
            return Err(ApiError::Api {
                status: 500,
                body: "remove failed".into(),
            });
        }
        let mut memberships = self.memberships.lock().unwrap();
        if let Some(members) = memberships.get_mut(id) {
            members.retain(|m| !usernames.contains(m));
        }
        Ok(())
    }

    async fn user_cost_center(&self, username: &str) -> ApiResult<Option<CostCenterRef>> {
        self.user_lookups.lock().unwrap().push(username.to_string());
        Ok(self.user_memberships.get(username).cloned())
    }
}

// ---------------------------------------------------------------------
// Budget store double
// ---------------------------------------------------------------------

#[derive(Default)]
pub struct MockBudgets {
    /// (cost-center NAME, product) pairs that already have a budget.
    pub existing: HashSet<(String, String)>,
    /// Simulate an enterprise without the budgets feature.
    pub unavailable: bool,
    /// Reject creations with a terminal error.
    pub fail_creates: bool,

    pub check_calls: Mutex<Vec<(String, String)>>,
    pub create_calls: Mutex<Vec<(String, String, String, u64)>>,
}

impl MockBudgets {
    pub fn with_existing(mut self, cost_center_name: &str, product: &str) -> Self {
        self.existing
            .insert((cost_center_name.to_string(), product.to_string()));
        self
    }
}

#[async_trait]
impl BudgetStore for MockBudgets {
    async fn has_budget(
        &self,
        _cost_center_id: &str,
        cost_center_name: &str,
        product: &str,
    ) -> ApiResult<bool> {
        self.check_calls
            .lock()
            .unwrap()
            .push((cost_center_name.to_string(), product.to_string()));
        if self.unavailable {
            return Err(ApiError::BudgetsUnavailable("budgets API disabled".into()));
        }
        Ok(self
            .existing
            .contains(&(cost_center_name.to_string(), product.to_string())))
    }

    async fn create_budget(
        &self,
        cost_center_id: &str,
        cost_center_name: &str,
        product: &str,
        amount: u64,
    ) -> ApiResult<bool> {
        self.create_calls.lock().unwrap().push((
            cost_center_id.to_string(),
            cost_center_name.to_string(),
            product.to_string(),
            amount,
        ));
        if self.unavailable {
            return Err(ApiError::BudgetsUnavailable("budgets API disabled".into()));
        }
        if self.fail_creates {
            return Err(ApiError::Api {
                status: 422,
                body: "budget rejected".into(),
            });
        }
        Ok(true)
    }
}

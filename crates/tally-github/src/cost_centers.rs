//! Cost-center CRUD and membership queries.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use tally_core::{ApiResult, CostCenter, CostCenterRef, CostCenterStore};

use crate::client::GithubClient;

/// JSON envelope for the cost-center list endpoint.
#[derive(Debug, Deserialize)]
struct CostCentersListResponse {
    #[serde(rename = "costCenters", default)]
    cost_centers: Vec<CostCenter>,
}

/// JSON envelope for the create endpoint.
#[derive(Debug, Deserialize)]
struct CostCenterCreateResponse {
    id: String,
}

/// JSON envelope for the detail endpoint.
#[derive(Debug, Deserialize)]
struct CostCenterDetailResponse {
    #[serde(default)]
    resources: Vec<Resource>,
}

/// A user or repository attached to a cost center.
#[derive(Debug, Deserialize)]
struct Resource {
    #[serde(rename = "type")]
    kind: String,
    name: String,
}

/// JSON envelope for the memberships endpoint.
#[derive(Debug, Deserialize)]
struct MembershipResponse {
    #[serde(default)]
    memberships: Vec<Membership>,
}

#[derive(Debug, Deserialize)]
struct Membership {
    cost_center: CostCenterRef,
}

impl GithubClient {
    fn cost_centers_url(&self) -> String {
        self.enterprise_url("/settings/billing/cost-centers")
    }

    async fn list_cost_centers(&self) -> ApiResult<Vec<CostCenter>> {
        let response: CostCentersListResponse = self.get(&self.cost_centers_url()).await?;
        Ok(response.cost_centers)
    }
}

#[async_trait]
impl CostCenterStore for GithubClient {
    async fn list_active_cost_centers(&self) -> ApiResult<HashMap<String, String>> {
        let all = self.list_cost_centers().await?;
        let total = all.len();

        let active: HashMap<String, String> = all
            .into_iter()
            .filter(|cc| cc.is_active() && !cc.name.is_empty() && !cc.id.is_empty())
            .map(|cc| (cc.name, cc.id))
            .collect();

        debug!(active = active.len(), total, "found active cost centers");
        Ok(active)
    }

    async fn create_cost_center(&self, name: &str) -> ApiResult<String> {
        let response: CostCenterCreateResponse = self
            .post(&self.cost_centers_url(), &json!({ "name": name }))
            .await?;
        info!(name, id = %response.id, "created cost center");
        Ok(response.id)
    }

    async fn find_cost_center_by_name(&self, name: &str) -> ApiResult<Option<CostCenter>> {
        let all = self.list_cost_centers().await?;

        let mut inactive = None;
        for cc in all {
            if cc.name != name {
                continue;
            }
            if cc.is_active() {
                info!(name, id = %cc.id, "found active cost center by name");
                return Ok(Some(cc));
            }
            if inactive.is_none() {
                inactive = Some(cc);
            }
        }
        Ok(inactive)
    }

    async fn cost_center_members(&self, id: &str) -> ApiResult<Vec<String>> {
        let url = format!("{}/{id}", self.cost_centers_url());
        let detail: CostCenterDetailResponse = self.get(&url).await?;

        let users: Vec<String> = detail
            .resources
            .into_iter()
            .filter(|r| r.kind == "User" && !r.name.is_empty())
            .map(|r| r.name)
            .collect();

        debug!(cost_center_id = id, count = users.len(), "cost center members");
        Ok(users)
    }

    async fn add_users(&self, id: &str, usernames: &[String]) -> ApiResult<()> {
        if usernames.is_empty() {
            return Ok(());
        }
        let url = format!("{}/{id}/resource", self.cost_centers_url());
        self.post_no_content(&url, &json!({ "users": usernames }))
            .await
    }

    async fn remove_users(&self, id: &str, usernames: &[String]) -> ApiResult<()> {
        if usernames.is_empty() {
            return Ok(());
        }
        let url = format!("{}/{id}/resource", self.cost_centers_url());
        self.delete_no_content(&url, &json!({ "users": usernames }))
            .await
    }

    async fn user_cost_center(&self, username: &str) -> ApiResult<Option<CostCenterRef>> {
        let url = format!(
            "{}/memberships?resource_type=user&name={username}",
            self.cost_centers_url()
        );

        // Lookup failures are reported as "not in any cost center": a broken
        // membership read must not block an addition.
        let response: MembershipResponse = match self.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                debug!(user = username, error = %e, "failed to check cost center membership");
                return Ok(None);
            }
        };

        Ok(response
            .memberships
            .into_iter()
            .next()
            .map(|m| m.cost_center))
    }
}

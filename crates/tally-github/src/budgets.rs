//! Spending-budget check and creation.
//!
//! The budgets endpoint is enterprise-optional: a 404 means the feature is
//! not enabled, which both operations surface as the distinct
//! [`ApiError::BudgetsUnavailable`] signal so callers can stop trying for
//! the rest of a run.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use tally_core::{ApiError, ApiResult, BudgetStore};

use crate::client::GithubClient;

#[derive(Debug, Deserialize)]
struct BudgetsListResponse {
    #[serde(default)]
    budgets: Vec<Budget>,
}

#[derive(Debug, Deserialize)]
struct Budget {
    #[serde(default)]
    budget_scope: String,
    #[serde(default)]
    budget_entity_name: String,
    #[serde(default)]
    budget_product_sku: String,
}

impl GithubClient {
    fn budgets_url(&self) -> String {
        self.enterprise_url("/settings/billing/budgets")
    }
}

/// Maps a 404 into the budgets-unavailable signal.
fn map_budget_error(enterprise: &str, err: ApiError) -> ApiError {
    if err.status() == Some(404) {
        ApiError::BudgetsUnavailable(format!(
            "budgets API is not available for enterprise '{enterprise}'"
        ))
    } else {
        err
    }
}

#[async_trait]
impl BudgetStore for GithubClient {
    async fn has_budget(
        &self,
        cost_center_id: &str,
        cost_center_name: &str,
        product: &str,
    ) -> ApiResult<bool> {
        let response: BudgetsListResponse = self
            .get(&self.budgets_url())
            .await
            .map_err(|e| map_budget_error(self.enterprise(), e))?;

        // The budget API records the cost-center display NAME as the entity
        // name even when the budget was created with the id, so the
        // existence check must match by name.
        let exists = response.budgets.iter().any(|b| {
            b.budget_scope == "cost_center"
                && b.budget_entity_name == cost_center_name
                && b.budget_product_sku == product
        });

        debug!(
            cost_center = cost_center_name,
            cost_center_id,
            product,
            exists,
            "checked for existing budget"
        );
        Ok(exists)
    }

    async fn create_budget(
        &self,
        cost_center_id: &str,
        cost_center_name: &str,
        product: &str,
        amount: u64,
    ) -> ApiResult<bool> {
        let payload = json!({
            "budget_type": "SkuPricing",
            "budget_product_sku": product,
            "budget_scope": "cost_center",
            "budget_amount": amount,
            "prevent_further_usage": true,
            "budget_entity_name": cost_center_id,
            "budget_alerting": {
                "will_alert": false,
                "alert_recipients": []
            }
        });

        self.post_no_content(&self.budgets_url(), &payload)
            .await
            .map_err(|e| map_budget_error(self.enterprise(), e))?;

        info!(
            cost_center = cost_center_name,
            cost_center_id, product, amount, "created budget"
        );
        Ok(true)
    }
}

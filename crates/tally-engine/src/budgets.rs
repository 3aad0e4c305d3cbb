//! Per-product budget provisioning for resolved cost centers.

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use tally_core::{ApiError, BudgetOutcome, BudgetStore, ProductBudget};

/// Ensures configured product budgets exist for cost centers.
///
/// The budgets API is enterprise-optional: after the first
/// [`BudgetOutcome::Unavailable`] the manager latches off and every later
/// call returns immediately, so a run never hammers a missing endpoint.
pub struct BudgetManager<'a, B: BudgetStore> {
    store: &'a B,
    products: &'a HashMap<String, ProductBudget>,
    unavailable: bool,
}

impl<'a, B: BudgetStore> BudgetManager<'a, B> {
    #[must_use]
    pub fn new(store: &'a B, products: &'a HashMap<String, ProductBudget>) -> Self {
        Self {
            store,
            products,
            unavailable: false,
        }
    }

    /// False once the budgets API has been detected as unavailable.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.unavailable
    }

    /// Ensures every enabled product budget exists for one cost center.
    ///
    /// Returns (product, outcome) pairs in product-name order. Existence is
    /// checked before creating, and the check matches by cost-center name
    /// (the budget API records the display name even when the id was
    /// supplied at creation).
    pub async fn ensure_for_cost_center(
        &mut self,
        cost_center_id: &str,
        cost_center_name: &str,
    ) -> Vec<(String, BudgetOutcome)> {
        let mut outcomes = Vec::new();
        if self.unavailable {
            return outcomes;
        }
        if self.products.is_empty() {
            debug!("no budget products configured, skipping budget creation");
            return outcomes;
        }

        info!(cost_center = cost_center_name, "ensuring budgets for cost center");

        // Sorted for reproducible call order and logs.
        let mut products: Vec<_> = self.products.iter().collect();
        products.sort_by(|a, b| a.0.cmp(b.0));

        for (product, settings) in products {
            if !settings.enabled {
                debug!(product = %product, "skipping disabled product budget");
                continue;
            }

            let outcome = self
                .ensure_product(cost_center_id, cost_center_name, product, settings.amount)
                .await;
            outcomes.push((product.clone(), outcome));

            if outcome == BudgetOutcome::Unavailable {
                warn!("budgets API unavailable, disabling budget creation for this run");
                self.unavailable = true;
                break;
            }
        }

        outcomes
    }

    async fn ensure_product(
        &self,
        cost_center_id: &str,
        cost_center_name: &str,
        product: &str,
        amount: u64,
    ) -> BudgetOutcome {
        match self
            .store
            .has_budget(cost_center_id, cost_center_name, product)
            .await
        {
            Ok(true) => {
                info!(
                    product,
                    cost_center = cost_center_name,
                    "budget already exists"
                );
                return BudgetOutcome::AlreadyExists;
            }
            Ok(false) => {}
            Err(ApiError::BudgetsUnavailable(message)) => {
                warn!(error = %message, "budget check hit unavailable endpoint");
                return BudgetOutcome::Unavailable;
            }
            // A failed check is not proof of absence, but blocking creation
            // on it would leave new cost centers without budgets; proceed
            // the way the check-then-create flow always has.
            Err(e) => {
                warn!(
                    product,
                    cost_center = cost_center_name,
                    error = %e,
                    "failed to check for existing budget, attempting creation"
                );
            }
        }

        match self
            .store
            .create_budget(cost_center_id, cost_center_name, product, amount)
            .await
        {
            Ok(true) => {
                info!(product, cost_center = cost_center_name, amount, "budget created");
                BudgetOutcome::Created
            }
            Ok(false) => {
                error!(product, cost_center = cost_center_name, "budget creation rejected");
                BudgetOutcome::Failed
            }
            Err(ApiError::BudgetsUnavailable(message)) => {
                warn!(error = %message, "budget creation hit unavailable endpoint");
                BudgetOutcome::Unavailable
            }
            Err(e) => {
                error!(
                    product,
                    cost_center = cost_center_name,
                    error = %e,
                    "failed to create budget"
                );
                BudgetOutcome::Failed
            }
        }
    }
}

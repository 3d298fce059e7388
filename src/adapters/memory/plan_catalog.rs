//! Fixed plan catalog.

use async_trait::async_trait;

use crate::domain::billing::Plan;
use crate::domain::foundation::DomainError;
use crate::ports::PlanCatalog;

/// Fixed plan list, looked up linearly by price id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanCatalog {
    plans: Vec<Plan>,
}

impl InMemoryPlanCatalog {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }
}

#[async_trait]
impl PlanCatalog for InMemoryPlanCatalog {
    async fn find_by_price_id(&self, price_id: &str) -> Result<Option<Plan>, DomainError> {
        Ok(self
            .plans
            .iter()
            .find(|p| p.stripe_price_id == price_id)
            .cloned())
    }
}

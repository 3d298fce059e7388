//! Plan catalog port (read only).

use async_trait::async_trait;

use crate::domain::billing::Plan;
use crate::domain::foundation::DomainError;

/// Lookup of internal plans by their Stripe price.
#[async_trait]
pub trait PlanCatalog: Send + Sync {
    /// Returns `None` when no plan is linked to `price_id`.
    async fn find_by_price_id(&self, price_id: &str) -> Result<Option<Plan>, DomainError>;
}

//! Subscription repository port (write side).
//!
//! Rows are keyed by the Stripe subscription id. Implementations must make
//! `upsert` a single merge-on-conflict write so checkout and lifecycle events
//! racing each other still converge on one row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::billing::{Subscription, SubscriptionChanges};
use crate::domain::foundation::DomainError;

/// Repository port for the Subscription aggregate.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert the subscription, or overwrite the row with the same
    /// `external_subscription_id`.
    async fn upsert(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Apply a partial update to the row with this external id.
    ///
    /// Returns `false` when no row matched. Nothing is created in that case.
    async fn update_by_external_id(
        &self,
        external_subscription_id: &str,
        changes: &SubscriptionChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    async fn find_by_external_id(
        &self,
        external_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;
}

//! In-memory SubscriptionRepository keyed by Stripe subscription id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::billing::{Subscription, SubscriptionChanges};
use crate::domain::foundation::DomainError;
use crate::ports::SubscriptionRepository;

/// Subscription store keyed by Stripe subscription id.
///
/// Counts successful writes so tests can assert that a delivery had no
/// side effects, and can be switched into a failing mode.
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    rows: RwLock<HashMap<String, Subscription>>,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with a database error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::database("subscription store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn upsert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        self.check_available()?;
        self.rows.write().await.insert(
            subscription.external_subscription_id.clone(),
            subscription.clone(),
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_by_external_id(
        &self,
        external_subscription_id: &str,
        changes: &SubscriptionChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        self.check_available()?;
        let mut rows = self.rows.write().await;
        let Some(row) = rows.get_mut(external_subscription_id) else {
            return Ok(false);
        };
        row.apply(changes, updated_at);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn find_by_external_id(
        &self,
        external_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self.rows.read().await.get(external_subscription_id).cloned())
    }
}

//! Mock payment provider for testing.
//!
//! Serves subscriptions from a map and supports one-shot error injection and
//! call counting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::billing::StripeSubscription;
use crate::ports::{PaymentError, PaymentProvider};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
/// mock.set_subscription(subscription);
/// mock.fail_next(PaymentError::network("timeout"));
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    subscriptions: HashMap<String, StripeSubscription>,
    next_error: Option<PaymentError>,
    fetches: usize,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a subscription under its id. Payloads without an id are dropped.
    pub fn set_subscription(&self, subscription: StripeSubscription) {
        if let Some(id) = subscription.id.clone() {
            self.state().subscriptions.insert(id, subscription);
        }
    }

    /// Fails the next call with `error`.
    pub fn fail_next(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Number of `get_subscription` calls so far.
    pub fn fetch_count(&self) -> usize {
        self.state().fetches
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<StripeSubscription>, PaymentError> {
        let mut state = self.state();
        state.fetches += 1;
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        Ok(state.subscriptions.get(subscription_id).cloned())
    }
}

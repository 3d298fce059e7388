//! Bounded, time-windowed dedup ledger.
//!
//! Entries older than the retention window are treated as absent; Stripe stops
//! retrying after three days, so a longer memory buys nothing. When the ledger
//! is full the oldest insertion is evicted first.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::domain::foundation::DomainError;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

pub const DEFAULT_CAPACITY: usize = 10_000;
pub const DEFAULT_RETENTION_SECS: u64 = 72 * 60 * 60;
const MAX_RETENTION_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Default)]
struct LedgerState {
    records: HashMap<String, WebhookEventRecord>,
    /// Event ids in insertion order, oldest first.
    order: VecDeque<String>,
}

pub struct InMemoryWebhookLedger {
    capacity: usize,
    retention: Duration,
    state: Mutex<LedgerState>,
}

impl InMemoryWebhookLedger {
    pub fn new(capacity: usize, retention_secs: u64) -> Self {
        Self {
            capacity: capacity.max(1),
            retention: Duration::seconds(retention_secs.min(MAX_RETENTION_SECS) as i64),
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.records.is_empty()
    }

    fn is_live(&self, record: &WebhookEventRecord, now: DateTime<Utc>) -> bool {
        record.processed_at >= now - self.retention
    }
}

impl Default for InMemoryWebhookLedger {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_RETENTION_SECS)
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookLedger {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        let state = self.state.lock().await;
        let now = Utc::now();
        Ok(state
            .records
            .get(event_id)
            .filter(|record| self.is_live(record, now))
            .cloned())
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        if let Some(existing) = state.records.get(&record.event_id) {
            if self.is_live(existing, now) {
                return Ok(SaveResult::AlreadyExists);
            }
            let stale = record.event_id.clone();
            state.order.retain(|id| id != &stale);
        }

        state.order.push_back(record.event_id.clone());
        state.records.insert(record.event_id.clone(), record);

        while state.records.len() > self.capacity {
            match state.order.pop_front() {
                Some(oldest) => {
                    state.records.remove(&oldest);
                }
                None => break,
            }
        }

        Ok(SaveResult::Inserted)
    }

    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut state = self.state.lock().await;
        let before = state.records.len();
        state.records.retain(|_, r| r.processed_at >= timestamp);
        let LedgerState { records, order } = &mut *state;
        order.retain(|id| records.contains_key(id));
        Ok((before - state.records.len()) as u64)
    }
}

//! WebhookEventRepository port - Dedup ledger of processed Stripe events.
//!
//! Stripe delivers at least once and retries for up to three days, so the same
//! event id can arrive many times. The ledger remembers which ids were already
//! applied so redeliveries are acknowledged without touching the billing store.
//!
//! Only outcomes that should never be retried (applied or ignored) are
//! recorded. A failed event stays absent so a provider redelivery can apply it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::DomainError;

/// Final outcome stored for an event id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOutcome {
    /// The event changed (or re-affirmed) billing state.
    Success,
    /// The event was recognized as a no-op.
    Ignored,
}

impl LedgerOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Ignored => "ignored",
        }
    }
}

/// Record of a processed webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEventRecord {
    /// Stripe event ID (evt_xxx format).
    pub event_id: String,

    /// Type of Stripe event (e.g., "checkout.session.completed").
    pub event_type: String,

    /// When the event was processed.
    pub processed_at: DateTime<Utc>,

    pub result: LedgerOutcome,

    /// Why the event was ignored, or a summary of what was applied.
    pub detail: Option<String>,
}

impl WebhookEventRecord {
    /// Creates a new success record.
    pub fn success(event_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            result: LedgerOutcome::Success,
            detail: None,
        }
    }

    /// Creates a new ignored record.
    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            result: LedgerOutcome::Ignored,
            detail: Some(reason.into()),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn processed_at(mut self, at: DateTime<Utc>) -> Self {
        self.processed_at = at;
        self
    }
}

/// Result of attempting to save a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was inserted (first time seeing this event).
    Inserted,
    /// Record already exists (duplicate event).
    AlreadyExists,
}

/// Port for storing and retrieving processed webhook events.
///
/// `save` must be insert-if-absent so two concurrent deliveries of the same
/// event cannot both record it.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Find a previously processed event by its Stripe event ID.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Attempt to save a webhook event record.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Delete records processed before `timestamp`. Returns the number removed.
    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError>;
}

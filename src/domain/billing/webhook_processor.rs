//! Webhook processor - Orchestrates idempotent webhook event handling.
//!
//! ## Design
//!
//! The processor follows these steps:
//! 1. Check whether the event id is already in the dedup ledger
//! 2. Dispatch the resolved event to the reconciler
//! 3. Record applied and ignored outcomes in the ledger
//!
//! Failures are not recorded, so the provider can redeliver them. Ledger
//! read or write problems are logged and never change the outcome: handlers
//! are idempotent, so a missed dedup costs at most one redundant write.

use std::sync::Arc;

use super::stripe_event::{BillingEvent, StripeEvent};
use super::webhook_errors::WebhookError;
use super::webhook_reconciler::{ReconcileAction, WebhookDispatcher};
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

/// Outcome of processing one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookResult {
    /// Event was applied.
    Processed(ReconcileAction),
    /// Event needed no action.
    Ignored(String),
    /// Event id was already in the ledger; nothing was done.
    AlreadyProcessed,
}

/// Processes webhook events with ledger-backed deduplication.
pub struct IdempotentWebhookProcessor {
    ledger: Arc<dyn WebhookEventRepository>,
    dispatcher: Arc<dyn WebhookDispatcher>,
}

impl IdempotentWebhookProcessor {
    pub fn new(
        ledger: Arc<dyn WebhookEventRepository>,
        dispatcher: Arc<dyn WebhookDispatcher>,
    ) -> Self {
        Self { ledger, dispatcher }
    }

    /// Process a delivery at most once per event id.
    ///
    /// # Returns
    ///
    /// - `Ok(WebhookResult::Processed)` - Event was applied
    /// - `Ok(WebhookResult::Ignored)` - Event was a no-op
    /// - `Ok(WebhookResult::AlreadyProcessed)` - Duplicate delivery
    /// - `Err(_)` - A handler failed; nothing was recorded
    pub async fn process(
        &self,
        envelope: &StripeEvent,
        event: &BillingEvent,
    ) -> Result<WebhookResult, WebhookError> {
        if let Some(event_id) = envelope.id.as_deref() {
            match self.ledger.find_by_event_id(event_id).await {
                Ok(Some(record)) => {
                    tracing::info!(
                        event_id,
                        event_type = %envelope.event_type,
                        first_processed_at = %record.processed_at,
                        "Duplicate webhook delivery skipped"
                    );
                    return Ok(WebhookResult::AlreadyProcessed);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(event_id, error = %e, "Dedup ledger lookup failed");
                }
            }
        }

        let result = match self.dispatcher.dispatch(event).await {
            Ok(action) => WebhookResult::Processed(action),
            Err(WebhookError::Ignored(reason)) => WebhookResult::Ignored(reason),
            Err(e) => return Err(e),
        };

        if let Some(event_id) = envelope.id.as_deref() {
            let record = match &result {
                WebhookResult::Processed(action) => {
                    WebhookEventRecord::success(event_id, &envelope.event_type)
                        .with_detail(action.summary())
                }
                WebhookResult::Ignored(reason) => {
                    WebhookEventRecord::ignored(event_id, &envelope.event_type, reason)
                }
                WebhookResult::AlreadyProcessed => return Ok(result),
            };
            self.record(record).await;
        }

        Ok(result)
    }

    async fn record(&self, record: WebhookEventRecord) {
        let event_id = record.event_id.clone();
        match self.ledger.save(record).await {
            Ok(SaveResult::Inserted) => {}
            Ok(SaveResult::AlreadyExists) => {
                tracing::debug!(
                    event_id = %event_id,
                    "Concurrent delivery recorded the event first"
                );
            }
            Err(e) => {
                tracing::warn!(event_id = %event_id, error = %e, "Failed to record webhook in ledger");
            }
        }
    }
}

//! SweepWebhookLedgerHandler - Drops dedup records older than the retention window.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::domain::foundation::DomainError;
use crate::ports::WebhookEventRepository;

pub struct SweepWebhookLedgerHandler {
    ledger: Arc<dyn WebhookEventRepository>,
    retention: Duration,
}

impl SweepWebhookLedgerHandler {
    pub fn new(ledger: Arc<dyn WebhookEventRepository>, retention: Duration) -> Self {
        Self { ledger, retention }
    }

    /// Deletes records processed before `now - retention`. Returns how many went.
    pub async fn handle(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let retention = chrono::Duration::from_std(self.retention)
            .unwrap_or_else(|_| chrono::Duration::days(365));
        self.ledger.delete_before(now - retention).await
    }

    /// Runs the sweep every `interval` until the task is aborted.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately; nothing is stale at startup.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match self.handle(Utc::now()).await {
                    Ok(0) => {}
                    Ok(deleted) => tracing::debug!(deleted, "Swept expired webhook ledger records"),
                    Err(e) => tracing::warn!(error = %e, "Webhook ledger sweep failed"),
                }
            }
        })
    }
}

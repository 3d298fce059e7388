//! Webhook processing configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Webhook ack policy and dedup ledger bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Acknowledge deliveries whose handler failed, so Stripe stops retrying.
    #[serde(default = "default_ack_on_handler_failure")]
    pub ack_on_handler_failure: bool,

    /// Permit running without a signing secret in production.
    #[serde(default)]
    pub allow_unsigned: bool,

    #[serde(default = "default_ledger_capacity")]
    pub ledger_capacity: usize,

    #[serde(default = "default_ledger_retention")]
    pub ledger_retention_secs: u64,

    #[serde(default = "default_ledger_sweep")]
    pub ledger_sweep_secs: u64,
}

impl WebhookConfig {
    pub fn ledger_retention(&self) -> Duration {
        Duration::from_secs(self.ledger_retention_secs)
    }

    pub fn ledger_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.ledger_sweep_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ledger_capacity == 0 {
            return Err(ValidationError::InvalidLedgerCapacity);
        }
        if self.ledger_sweep_secs == 0 {
            return Err(ValidationError::InvalidLedgerSweep);
        }
        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            ack_on_handler_failure: default_ack_on_handler_failure(),
            allow_unsigned: false,
            ledger_capacity: default_ledger_capacity(),
            ledger_retention_secs: default_ledger_retention(),
            ledger_sweep_secs: default_ledger_sweep(),
        }
    }
}

fn default_ack_on_handler_failure() -> bool {
    true
}

fn default_ledger_capacity() -> usize {
    10_000
}

// Stripe retries for up to three days.
fn default_ledger_retention() -> u64 {
    72 * 60 * 60
}

fn default_ledger_sweep() -> u64 {
    300
}

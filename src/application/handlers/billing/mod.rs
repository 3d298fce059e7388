//! Billing handlers.
//!
//! ## Commands
//! - Processing Stripe webhook deliveries
//! - Sweeping expired dedup ledger records

mod handle_stripe_webhook;
mod sweep_webhook_ledger;

pub use handle_stripe_webhook::{
    HandleStripeWebhookCommand, HandleStripeWebhookHandler, HandleStripeWebhookResult,
};
pub use sweep_webhook_ledger::SweepWebhookLedgerHandler;

//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Billing Store Ports
//!
//! - `InvoiceRepository` - Records payments against invoices
//! - `SubscriptionRepository` - Upserts and updates mirrored subscriptions
//! - `PlanCatalog` - Resolves Stripe prices to internal plans
//!
//! ## Provider Ports
//!
//! - `PaymentProvider` - Supplementary reads from Stripe
//!
//! ## Webhook Ports
//!
//! - `WebhookEventRepository` - Dedup ledger of processed event ids

mod invoice_repository;
mod payment_provider;
mod plan_catalog;
mod subscription_repository;
mod webhook_event_repository;

pub use invoice_repository::InvoiceRepository;
pub use payment_provider::{PaymentError, PaymentErrorCode, PaymentProvider};
pub use plan_catalog::PlanCatalog;
pub use subscription_repository::SubscriptionRepository;
pub use webhook_event_repository::{
    LedgerOutcome, SaveResult, WebhookEventRecord, WebhookEventRepository,
};

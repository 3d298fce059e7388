//! In-memory adapters.
//!
//! The webhook ledger is the production dedup store for a single instance.
//! The billing stores back local development and tests.

mod invoice_repository;
mod plan_catalog;
mod subscription_repository;
mod webhook_ledger;

pub use invoice_repository::InMemoryInvoiceRepository;
pub use plan_catalog::InMemoryPlanCatalog;
pub use subscription_repository::InMemorySubscriptionRepository;
pub use webhook_ledger::InMemoryWebhookLedger;

//! REST persistence adapters.
//!
//! The billing store is a hosted Postgres exposed through a PostgREST-style
//! API. Every request carries the service key as both `apikey` and bearer
//! token; row filters use the `column=eq.value` query syntax.
//!
//! Tables:
//! - `invoices` - payment fields patched by checkout webhooks
//! - `subscriptions` - unique on `stripe_subscription_id`
//! - `plans` - read only, looked up by `stripe_price_id`

mod client;
mod invoice_repository;
mod plan_catalog;
mod rows;
mod subscription_repository;

pub use client::{RestClient, RestConfig};
pub use invoice_repository::RestInvoiceRepository;
pub use plan_catalog::RestPlanCatalog;
pub use subscription_repository::RestSubscriptionRepository;

//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (errors)
//! - `billing` - Invoices, subscriptions, plans and Stripe webhook reconciliation

pub mod billing;
pub mod foundation;

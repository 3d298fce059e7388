//! Billing Reconciler - Stripe webhook ingestion for invoicing.
//!
//! Receives Stripe webhook deliveries, authenticates them against the signing
//! secret, and reconciles invoices and subscriptions in the billing store.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - axum webhook endpoint
//! - `memory` - In-memory stores (dedup ledger, test doubles)
//! - `rest` - REST billing store
//! - `stripe` - Stripe API client

pub mod http;
pub mod memory;
pub mod rest;
pub mod stripe;

//! HTTP adapters - axum endpoint exposure.

mod cors;
pub mod webhook;

pub use cors::build_cors;
pub use webhook::{webhook_router, WebhookAppState};

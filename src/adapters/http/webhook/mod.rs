//! HTTP adapter for Stripe webhook delivery.
//!
//! - `POST /` - Receive a Stripe webhook
//! - `POST /webhooks/stripe` - Same handler, conventional path
//! - `GET /health` - Liveness probe

pub mod dto;
mod handlers;
mod routes;

pub use handlers::{handle_stripe_webhook, health, WebhookApiError, WebhookAppState};
pub use routes::webhook_router;

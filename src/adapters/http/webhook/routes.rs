//! Axum router for the webhook service.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{handle_stripe_webhook, health, WebhookAppState};
use crate::adapters::http::build_cors;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Create the service router.
///
/// # Routes
/// - `POST /` - Receive a Stripe webhook
/// - `POST /webhooks/stripe` - Receive a Stripe webhook
/// - `GET /health` - Liveness probe
///
/// CORS preflight is answered by the CORS layer for every route. Bodies over
/// 1 MiB are rejected before reaching the handler.
pub fn webhook_router(state: WebhookAppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", post(handle_stripe_webhook))
        .route("/webhooks/stripe", post(handle_stripe_webhook))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(build_cors(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

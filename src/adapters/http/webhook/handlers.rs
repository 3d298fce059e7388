//! HTTP handlers for the webhook endpoint.
//!
//! These handlers connect axum routes to the application layer command handler.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::{HandleStripeWebhookCommand, HandleStripeWebhookHandler};
use crate::domain::billing::{IdempotentWebhookProcessor, StripeWebhookVerifier, WebhookError};

use super::dto::{ErrorResponse, HealthResponse, ReceivedResponse};

const SIGNATURE_HEADER: &str = "stripe-signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state, cloned per request.
#[derive(Clone)]
pub struct WebhookAppState {
    pub verifier: Arc<StripeWebhookVerifier>,
    pub processor: Arc<IdempotentWebhookProcessor>,
    pub ack_on_handler_failure: bool,
}

impl WebhookAppState {
    pub fn webhook_handler(&self) -> HandleStripeWebhookHandler {
        HandleStripeWebhookHandler::new(
            self.verifier.clone(),
            self.processor.clone(),
            self.ack_on_handler_failure,
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST / - Receive a Stripe webhook
///
/// The body is taken as raw bytes: the signature covers the exact bytes sent.
pub async fn handle_stripe_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ReceivedResponse>, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandleStripeWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    // Applied, ignored, duplicate and acknowledged failures all get the same body.
    state.webhook_handler().handle(cmd).await?;
    Ok(Json(ReceivedResponse::ok()))
}

/// GET /health - Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Converts webhook errors to HTTP responses.
///
/// Every authentication failure gets the same body so callers learn nothing
/// about which check failed.
#[derive(Debug)]
pub struct WebhookApiError(pub WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status == StatusCode::OK {
            return (status, Json(ReceivedResponse::ok())).into_response();
        }

        let message = if self.0.is_authentication_failure() {
            WebhookError::InvalidSignature.to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

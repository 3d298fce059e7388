//! Webhook error types for Stripe webhook handling.
//!
//! Defines all error conditions that can occur during webhook processing,
//! with HTTP status code mapping and retryability semantics.

use http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;
use crate::ports::PaymentError;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Verification is enforced but no Stripe-Signature header was sent.
    #[error("Missing signature header")]
    MissingSignature,

    /// Stripe-Signature header could not be parsed.
    #[error("Malformed signature header: {0}")]
    MalformedSignatureHeader(String),

    /// Webhook timestamp is outside the acceptable window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Failed to parse the webhook payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// The provider no longer knows the subscription a checkout referenced.
    #[error("Subscription not found at provider: {0}")]
    SubscriptionNotFound(String),

    /// Reading or writing the billing store failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Fetching supplementary data from Stripe failed.
    #[error("Payment provider error: {0}")]
    Provider(String),
}

impl WebhookError {
    /// True for every failure that means the request could not be authenticated.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::InvalidSignature
                | WebhookError::MissingSignature
                | WebhookError::MalformedSignatureHeader(_)
                | WebhookError::TimestampOutOfRange
        )
    }

    /// Returns true if Stripe should retry delivering this webhook.
    ///
    /// Retryable errors indicate temporary failures that may succeed
    /// on subsequent attempts.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Persistence(_)
                | WebhookError::Provider(_)
                | WebhookError::SubscriptionNotFound(_)
        )
    }

    /// Maps the error to an HTTP status code.
    ///
    /// - 2xx: Event acknowledged, no retry
    /// - 4xx: Client error, no retry
    /// - 5xx: Server error, will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature
            | WebhookError::MissingSignature
            | WebhookError::MalformedSignatureHeader(_)
            | WebhookError::TimestampOutOfRange => StatusCode::UNAUTHORIZED,

            WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,

            WebhookError::Ignored(_) => StatusCode::OK,

            WebhookError::SubscriptionNotFound(_)
            | WebhookError::Persistence(_)
            | WebhookError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Persistence(err.to_string())
    }
}

impl From<PaymentError> for WebhookError {
    fn from(err: PaymentError) -> Self {
        WebhookError::Provider(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    // ══════════════════════════════════════════════════════════════
    // Error Display Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn invalid_signature_displays_correctly() {
        assert_eq!(WebhookError::InvalidSignature.to_string(), "Invalid signature");
    }

    #[test]
    fn parse_error_displays_message() {
        let err = WebhookError::ParseError("invalid JSON".to_string());
        assert_eq!(err.to_string(), "Parse error: invalid JSON");
    }

    #[test]
    fn ignored_displays_reason() {
        let err = WebhookError::Ignored("checkout has no invoice".to_string());
        assert_eq!(err.to_string(), "Event ignored: checkout has no invoice");
    }

    // ══════════════════════════════════════════════════════════════
    // Classification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn signature_failures_are_authentication_failures() {
        assert!(WebhookError::InvalidSignature.is_authentication_failure());
        assert!(WebhookError::MissingSignature.is_authentication_failure());
        assert!(WebhookError::TimestampOutOfRange.is_authentication_failure());
        assert!(WebhookError::MalformedSignatureHeader("x".into()).is_authentication_failure());
        assert!(!WebhookError::ParseError("x".into()).is_authentication_failure());
    }

    #[test]
    fn downstream_failures_are_retryable() {
        assert!(WebhookError::Persistence("timeout".into()).is_retryable());
        assert!(WebhookError::Provider("502".into()).is_retryable());
        assert!(!WebhookError::InvalidSignature.is_retryable());
        assert!(!WebhookError::Ignored("noop".into()).is_retryable());
    }

    // ══════════════════════════════════════════════════════════════
    // Status Code Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn authentication_failures_return_unauthorized() {
        assert_eq!(WebhookError::InvalidSignature.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(WebhookError::MissingSignature.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            WebhookError::TimestampOutOfRange.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn parse_error_returns_bad_request() {
        let err = WebhookError::ParseError("syntax error".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn ignored_returns_ok() {
        let err = WebhookError::Ignored("not relevant".to_string());
        assert_eq!(err.status_code(), StatusCode::OK);
    }

    #[test]
    fn persistence_error_returns_internal_error() {
        let err = WebhookError::Persistence("connection lost".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    // ══════════════════════════════════════════════════════════════
    // Conversions
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn domain_error_converts_to_persistence() {
        let err: WebhookError = DomainError::new(ErrorCode::DatabaseError, "boom").into();
        assert!(matches!(err, WebhookError::Persistence(msg) if msg.contains("boom")));
    }

    #[test]
    fn payment_error_converts_to_provider() {
        let err: WebhookError = PaymentError::network("reset by peer").into();
        assert!(matches!(err, WebhookError::Provider(msg) if msg.contains("reset by peer")));
    }
}

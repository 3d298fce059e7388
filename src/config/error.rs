//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid persistence URL format")]
    InvalidPersistenceUrl,

    #[error("Persistence URL must use HTTPS in production")]
    PersistenceMustBeHttps,

    #[error("Invalid Stripe API key format")]
    InvalidStripeKey,

    #[error("Invalid Stripe webhook secret format")]
    InvalidStripeWebhookSecret,

    #[error("Invalid Stripe API base URL")]
    InvalidStripeBaseUrl,

    #[error("Webhook signing secret is required in production unless unsigned webhooks are explicitly allowed")]
    UnsignedWebhooksInProduction,

    #[error("Ledger capacity must be at least 1")]
    InvalidLedgerCapacity,

    #[error("Ledger sweep interval must be at least 1 second")]
    InvalidLedgerSweep,
}

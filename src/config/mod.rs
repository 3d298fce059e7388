//! Service configuration.
//!
//! Everything comes from environment variables (optionally seeded from a `.env`
//! file) under the `BILLING_RECONCILER` prefix, with `__` between nesting levels.
//!
//! # Example
//!
//! ```no_run
//! use billing_reconciler::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod error;
mod payment;
mod persistence;
mod server;
mod webhook;

pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use persistence::PersistenceConfig;
pub use server::{Environment, ServerConfig};
pub use webhook::WebhookConfig;

use serde::Deserialize;

use crate::domain::billing::VerificationMode;

/// Root configuration. Build with [`AppConfig::load()`], then [`AppConfig::validate()`].
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Listener and process settings
    #[serde(default)]
    pub server: ServerConfig,

    /// REST billing store
    pub persistence: PersistenceConfig,

    /// Stripe credentials
    pub payment: PaymentConfig,

    /// Ack policy and dedup ledger
    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl AppConfig {
    /// Reads `.env` (if present) and the process environment.
    ///
    /// # Variable Names
    ///
    /// - `BILLING_RECONCILER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BILLING_RECONCILER__PAYMENT__STRIPE_API_KEY=...` -> `payment.stripe_api_key = ...`
    ///
    /// # Errors
    ///
    /// Fails when a required value is missing or a value does not parse.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BILLING_RECONCILER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic checks that deserialization cannot express.
    ///
    /// Beyond per-section checks, production refuses to start without a
    /// webhook signing secret unless `webhook.allow_unsigned` is set.
    ///
    /// # Errors
    ///
    /// The first failing check.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.persistence.validate(self.is_production())?;
        self.payment.validate()?;
        self.webhook.validate()?;

        if self.is_production()
            && !self.verification_mode().is_enforced()
            && !self.webhook.allow_unsigned
        {
            return Err(ValidationError::UnsignedWebhooksInProduction);
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Signature verification mode implied by the configured secret.
    pub fn verification_mode(&self) -> VerificationMode {
        VerificationMode::from_secret(self.payment.webhook_secret())
    }
}

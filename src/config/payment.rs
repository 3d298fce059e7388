//! Stripe credentials.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Stripe API key, webhook signing secret and API location.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Secret key (`sk_test_...` / `sk_live_...`)
    pub stripe_api_key: SecretString,

    /// Stripe webhook signing secret. Absent or empty disables verification.
    #[serde(default)]
    pub stripe_webhook_secret: Option<SecretString>,

    /// Stripe API base URL (stripe-mock in local setups)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl PaymentConfig {
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_test_")
    }

    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_live_")
    }

    /// The webhook secret, if one is configured and non-empty.
    pub fn webhook_secret(&self) -> Option<SecretString> {
        self.stripe_webhook_secret
            .as_ref()
            .filter(|s| !s.expose_secret().is_empty())
            .cloned()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let api_key = self.stripe_api_key.expose_secret();
        if api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }

        if !api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if let Some(secret) = self.webhook_secret() {
            if !secret.expose_secret().starts_with("whsec_") {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidStripeBaseUrl);
        }

        Ok(())
    }
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

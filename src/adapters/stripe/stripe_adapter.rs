//! Stripe payment provider adapter.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_base_url("http://localhost:12111");
//! let adapter = StripePaymentAdapter::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::billing::StripeSubscription;
use crate::ports::{PaymentError, PaymentProvider};

pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    request_timeout: Duration,
}

impl StripeConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Set a custom API base URL (stripe-mock or tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PaymentError::provider(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<StripeSubscription>, PaymentError> {
        let url = format!(
            "{}/v1/subscriptions/{}",
            self.config.api_base_url, subscription_id
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::warn!(subscription_id, "Stripe returned 404 for subscription");
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(subscription_id, status, error = %error_text, "Stripe get_subscription failed");
            return Err(PaymentError::from_status(status, error_text));
        }

        let subscription: StripeSubscription = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(Some(subscription))
    }
}

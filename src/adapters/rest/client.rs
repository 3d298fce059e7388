//! Shared HTTP client for the REST billing store.
//!
//! Every request carries the service key twice, as `apikey` and as a bearer
//! token. Non-2xx responses become `DomainError::database` naming the
//! operation and HTTP status.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::{DomainError, ErrorCode};

/// Connection settings for the REST billing store.
#[derive(Clone)]
pub struct RestConfig {
    pub base_url: String,
    pub service_key: SecretString,
    pub request_timeout: Duration,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>, service_key: SecretString) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Shared HTTP client for all table adapters.
#[derive(Clone)]
pub struct RestClient {
    base_url: String,
    service_key: SecretString,
    http: reqwest::Client,
}

impl RestClient {
    pub fn new(config: RestConfig) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Failed to build HTTP client: {}", e),
                )
            })?;
        Ok(Self {
            base_url: config.base_url,
            service_key: config.service_key,
            http,
        })
    }

    /// Starts an authenticated request against `/rest/v1/{table}`.
    pub(crate) fn table(&self, method: Method, table: &str) -> RequestBuilder {
        let key = self.service_key.expose_secret();
        self.http
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", key.as_str())
            .bearer_auth(key)
    }

    /// Sends the request and turns transport errors and non-2xx statuses into
    /// database errors.
    pub(crate) async fn send(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> Result<Response, DomainError> {
        let response = request.send().await.map_err(|e| {
            DomainError::database(format!("{} failed: {}", operation, e))
                .with_detail("operation", operation)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(operation, status = status.as_u16(), error = %body, "Billing store request failed");
            return Err(
                DomainError::database(format!("{} failed: HTTP {}: {}", operation, status, body))
                    .with_detail("operation", operation)
                    .with_detail("status", status.as_u16().to_string()),
            );
        }

        Ok(response)
    }

    /// Decodes a JSON array response body.
    pub(crate) async fn rows<T: serde::de::DeserializeOwned>(
        response: Response,
        operation: &'static str,
    ) -> Result<Vec<T>, DomainError> {
        response.json::<Vec<T>>().await.map_err(|e| {
            DomainError::database(format!("{} returned unreadable rows: {}", operation, e))
        })
    }
}

/// PostgREST equality filter value.
pub(crate) fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

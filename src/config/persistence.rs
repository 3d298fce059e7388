//! Persistence configuration (REST billing store)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Base URL of the REST endpoint, e.g. `https://project.example.co`
    pub url: String,

    /// Service-role credential sent as `apikey` and bearer token
    pub service_key: SecretString,
}

impl PersistenceConfig {
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("PERSISTENCE_URL"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ValidationError::InvalidPersistenceUrl);
        }
        if production && !self.url.starts_with("https://") {
            return Err(ValidationError::PersistenceMustBeHttps);
        }
        if self.service_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PERSISTENCE_SERVICE_KEY"));
        }
        Ok(())
    }
}

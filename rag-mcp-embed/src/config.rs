//! Configuration for the remote embedding service

use crate::error::{EmbedError, Result};
use std::time::Duration;

/// Default request timeout for embedding calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where and how to reach an OpenAI-compatible embedding endpoint.
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    /// Base URL of the API, e.g. `http://localhost:1234/v1`. `/embeddings` is appended.
    pub base_url: String,
    /// Model identifier sent with every request
    pub model_name: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl EmbedConfig {
    /// Create a configuration with no API key and the default timeout.
    pub fn new(base_url: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model_name: model_name.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the bearer token. Empty keys are treated as "no key".
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The full URL embedding requests are posted to.
    pub fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(EmbedError::invalid_config("base_url must not be empty"));
        }
        if self.model_name.trim().is_empty() {
            return Err(EmbedError::invalid_config("model name must not be empty"));
        }
        if self.timeout.is_zero() {
            return Err(EmbedError::invalid_config("timeout must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embeddings_url_joins_cleanly() {
        let config = EmbedConfig::new("http://localhost:1234/v1", "m");
        assert_eq!(config.embeddings_url(), "http://localhost:1234/v1/embeddings");

        let config = EmbedConfig::new("http://localhost:1234/v1/", "m");
        assert_eq!(config.embeddings_url(), "http://localhost:1234/v1/embeddings");
    }

    #[test]
    fn test_empty_api_key_means_none() {
        let config = EmbedConfig::new("http://x", "m").with_api_key("");
        assert!(config.api_key.is_none());

        let config = EmbedConfig::new("http://x", "m").with_api_key("sk-local");
        assert_eq!(config.api_key.as_deref(), Some("sk-local"));
    }

    #[test]
    fn test_validation() {
        assert!(EmbedConfig::new("http://x", "m").validate().is_ok());
        assert!(matches!(
            EmbedConfig::new("", "m").validate(),
            Err(EmbedError::InvalidConfig { .. })
        ));
        assert!(EmbedConfig::new("http://x", " ").validate().is_err());
        assert!(
            EmbedConfig::new("http://x", "m")
                .with_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }
}

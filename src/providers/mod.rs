//! Completion API providers.
//!
//! A [`Provider`] turns one [`CompletionRequest`] into the model's reply text.
//! The explainer client only depends on this trait, so the HTTP backend can be
//! replaced by a stub.

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use openai::OpenAIProvider;

/// Environment variable holding the API key
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Request timeout used when none is configured, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A single chat completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System message
    pub system: String,
    /// User message
    pub user: String,
    pub temperature: f64,
    /// Maximum tokens to generate
    pub max_tokens: u32,
}

/// Provider trait for chat completion backends
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Get the current model name/identifier
    fn model_name(&self) -> &str;

    /// Send the request and return the reply text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

/// Provider configuration for API-based providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (required)
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Base URL override (for compatible endpoints and tests)
    pub base_url: Option<String>,
    /// Whole-request timeout
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Error types for provider operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API key not configured for {provider}. Set {env_var} environment variable.")]
    MissingApiKey { provider: String, env_var: String },

    #[error("Could not create HTTP client: {0}")]
    ClientSetup(String),

    #[error("Request to {provider} timed out")]
    Timeout { provider: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error from {provider}: {message}")]
    ApiError { provider: String, message: String },

    #[error("Rate limited by {provider}. Please wait and try again.")]
    RateLimited { provider: String },

    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },
}

impl ProviderError {
    /// Whether this error happened before any request could be made
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ProviderError::MissingApiKey { .. } | ProviderError::ClientSetup(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_default() {
        let config = ProviderConfig::default();
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.api_key.is_none());
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_missing_api_key_message() {
        let err = ProviderError::MissingApiKey {
            provider: "OpenAI".to_string(),
            env_var: API_KEY_ENV_VAR.to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API key not configured for OpenAI. Set OPENAI_API_KEY environment variable."
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_transport_errors_are_not_configuration() {
        assert!(!ProviderError::Timeout {
            provider: "OpenAI".to_string()
        }
        .is_configuration());
        assert!(!ProviderError::NetworkError("refused".to_string()).is_configuration());
    }
}

//! OpenAI API provider.
//!
//! This provider uses the OpenAI Chat Completions API. Any endpoint speaking
//! the same protocol can be targeted through `base_url`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CompletionRequest, Provider, ProviderConfig, ProviderError, API_KEY_ENV_VAR};

/// OpenAI API base URL
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const PROVIDER_NAME: &str = "OpenAI";

/// OpenAI provider
pub struct OpenAIProvider {
    /// HTTP client
    client: Client,
    /// API key
    api_key: String,
    /// Model to use
    model: String,
    /// Full chat completions URL
    endpoint: String,
}

impl OpenAIProvider {
    /// Create a provider. Fails if no API key is configured.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey {
                provider: PROVIDER_NAME.to_string(),
                env_var: API_KEY_ENV_VAR.to_string(),
            })?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::ClientSetup(e.to_string()))?;

        let base = config.base_url.as_deref().unwrap_or(OPENAI_API_BASE);
        let endpoint = format!("{}/chat/completions", base.trim_end_matches('/'));

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            endpoint,
        })
    }

    /// Build the request body
    fn build_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(request.system.clone()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(request.user.clone()),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout {
                provider: PROVIDER_NAME.to_string(),
            }
        } else {
            ProviderError::NetworkError(error.to_string())
        }
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let body = self.build_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited {
                    provider: PROVIDER_NAME.to_string(),
                });
            }
            return Err(ProviderError::ApiError {
                provider: PROVIDER_NAME.to_string(),
                message: format!("HTTP {}: {}", status, error_body),
            });
        }

        let response_body: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                ProviderError::InvalidResponse {
                    provider: PROVIDER_NAME.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let parts: Vec<String> = response_body
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.and_then(|m| m.content))
            .collect();

        if parts.is_empty() {
            return Err(ProviderError::InvalidResponse {
                provider: PROVIDER_NAME.to_string(),
                message: "response contained no message content".to_string(),
            });
        }

        Ok(parts.join(""))
    }
}

// API types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            api_key: Some("test-key".to_string()),
            model: "gpt-4o-mini".to_string(),
            base_url: Some(base_url.to_string()),
            timeout: Duration::from_secs(5),
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "system prompt".to_string(),
            user: "user prompt".to_string(),
            temperature: 0.3,
            max_tokens: 1000,
        }
    }

    #[test]
    fn test_openai_provider_creation() {
        let provider = OpenAIProvider::new(&config("http://localhost")).unwrap();
        assert_eq!(provider.name(), "OpenAI");
        assert_eq!(provider.model_name(), "gpt-4o-mini");
        assert_eq!(provider.endpoint, "http://localhost/chat/completions");
    }

    #[test]
    fn test_default_endpoint() {
        let config = ProviderConfig {
            api_key: Some("k".to_string()),
            ..ProviderConfig::default()
        };
        let provider = OpenAIProvider::new(&config).unwrap();
        assert_eq!(
            provider.endpoint,
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_missing_api_key_fails_construction() {
        let missing = ProviderConfig::default();
        assert!(matches!(
            OpenAIProvider::new(&missing),
            Err(ProviderError::MissingApiKey { .. })
        ));

        let blank = ProviderConfig {
            api_key: Some("   ".to_string()),
            ..ProviderConfig::default()
        };
        assert!(matches!(
            OpenAIProvider::new(&blank),
            Err(ProviderError::MissingApiKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_complete_sends_chat_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "temperature": 0.3,
                "max_tokens": 1000,
                "messages": [
                    {"role": "system", "content": "system prompt"},
                    {"role": "user", "content": "user prompt"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{"message": {"role": "assistant", "content": "{\"summary\": \"ok\"}"}}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = OpenAIProvider::new(&config(&server.url())).unwrap();
        let reply = provider.complete(&request()).await.unwrap();

        assert_eq!(reply, "{\"summary\": \"ok\"}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_maps_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let provider = OpenAIProvider::new(&config(&server.url())).unwrap();
        let err = provider.complete(&request()).await.unwrap_err();

        match err {
            ProviderError::ApiError { message, .. } => {
                assert!(message.contains("401"));
                assert!(message.contains("invalid api key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_maps_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .create_async()
            .await;

        let provider = OpenAIProvider::new(&config(&server.url())).unwrap();
        assert!(matches!(
            provider.complete(&request()).await,
            Err(ProviderError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn test_complete_rejects_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let provider = OpenAIProvider::new(&config(&server.url())).unwrap();
        assert!(matches!(
            provider.complete(&request()).await,
            Err(ProviderError::InvalidResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_complete_rejects_non_json_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let provider = OpenAIProvider::new(&config(&server.url())).unwrap();
        assert!(matches!(
            provider.complete(&request()).await,
            Err(ProviderError::InvalidResponse { .. })
        ));
    }
}

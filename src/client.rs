//! Explainer client: one failure in, one explanation out.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::explanation::Explanation;
use crate::failure::FailureRecord;
use crate::parser::{self, ParseError};
use crate::prompt;
use crate::providers::{CompletionRequest, OpenAIProvider, Provider, ProviderError};

/// Sampling temperature for explanation requests
pub const TEMPERATURE: f64 = 0.3;

/// Reply length bound for explanation requests
pub const MAX_TOKENS: u32 = 1000;

/// Why an explanation could not be produced
#[derive(Debug, thiserror::Error)]
pub enum ExplainError {
    /// The request failed: network, timeout, or a non-success status
    #[error(transparent)]
    Transport(#[from] ProviderError),

    /// The reply arrived but could not be mapped
    #[error("{source}")]
    Parse {
        /// The raw reply
        content: String,
        #[source]
        source: ParseError,
    },
}

impl ExplainError {
    /// Text embedded in the fallback explanation: the raw reply for parse
    /// failures, the error message otherwise
    pub fn fallback_detail(&self) -> String {
        match self {
            ExplainError::Transport(e) => e.to_string(),
            ExplainError::Parse { content, .. } => content.clone(),
        }
    }
}

/// Sends failures to a completion provider and parses the replies
#[derive(Clone)]
pub struct ExplainerClient {
    provider: Arc<dyn Provider>,
}

impl ExplainerClient {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    /// Build an OpenAI-backed client. A missing API key fails here, never
    /// when explaining.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let provider = OpenAIProvider::new(&config.provider_config())?;
        Ok(Self::new(Arc::new(provider)))
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// The request sent for a failure
    pub fn build_request(record: &FailureRecord) -> CompletionRequest {
        let prompt = prompt::build_prompt(record);
        CompletionRequest {
            system: prompt.system,
            user: prompt.user,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    /// Explain a failure, reporting transport and parse failures separately
    pub async fn try_explain(&self, record: &FailureRecord) -> Result<Explanation, ExplainError> {
        let request = Self::build_request(record);

        let start = Instant::now();
        let result = self.provider.complete(&request).await;
        tracing::debug!(
            provider = self.provider.name(),
            model = self.provider.model_name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "completion request finished"
        );

        let content = result?;
        parser::parse_response(&content).map_err(|source| ExplainError::Parse { content, source })
    }

    /// Explain a failure. Never fails: any error yields the fallback
    /// explanation.
    pub async fn explain(&self, record: &FailureRecord) -> Explanation {
        match self.try_explain(record).await {
            Ok(explanation) => explanation,
            Err(e) => {
                tracing::warn!(command = %record.command, error = %e, "explanation failed, using fallback");
                parser::fallback_explanation(&e.fallback_detail())
            }
        }
    }
}

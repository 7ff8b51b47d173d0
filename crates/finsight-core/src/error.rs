//! Error types for quote, news and narrative operations

use finsight_llm::LLMError;
use finsight_prompt::PromptError;
use finsight_utils::EnvError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Failure of any outbound provider call
///
/// This is the single taxonomy the pipeline deals with: a missing credential
/// is reported the same way as a network failure or an unknown ticker.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Input rejected before any call was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A required API key or id is not configured
    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    /// Network or HTTP transport error
    #[error("{provider} request failed: {message}")]
    Network { provider: String, message: String },

    /// The call did not finish within the configured timeout
    #[error("{provider} did not respond within {secs}s")]
    Timeout { provider: String, secs: u64 },

    /// Credentials were rejected
    #[error("{provider} rejected the credentials")]
    Authentication { provider: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded for {provider}")]
    RateLimited { provider: String },

    /// The market-data provider does not know the ticker
    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    /// The payload did not have the expected shape
    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse { provider: String, message: String },

    /// Completion provider error
    #[error("Completion failed: {0}")]
    Completion(#[from] LLMError),

    /// Prompt rendering error
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

impl ProviderError {
    /// Network error from anything displayable
    pub fn network(provider: &str, err: impl std::fmt::Display) -> Self {
        Self::Network {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }

    /// Malformed payload error
    pub fn malformed(provider: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(provider: &str, status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Authentication {
                provider: provider.to_string(),
            },
            400 if body.contains("API key not valid") => Self::Authentication {
                provider: provider.to_string(),
            },
            429 => Self::RateLimited {
                provider: provider.to_string(),
            },
            _ => Self::Network {
                provider: provider.to_string(),
                message: format!("HTTP {status}: {}", truncate(body, 200)),
            },
        }
    }

    /// Classify a transport error from a client built with `limit` as its timeout
    pub fn request(provider: &str, limit: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                provider: provider.to_string(),
                secs: limit.as_secs(),
            };
        }
        Self::network(provider, err)
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse {
            provider: "json".to_string(),
            message: err.to_string(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Run a provider call with an explicit deadline
pub(crate) async fn with_timeout<T, F>(provider: &str, limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            provider: provider.to_string(),
            secs: limit.as_secs(),
        }),
    }
}

/// Configuration errors, raised at startup or on reconfiguration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is out of range or inconsistent
    #[error("Configuration error: {0}")]
    Invalid(String),

    /// An environment variable could not be parsed
    #[error(transparent)]
    Env(#[from] EnvError),

    /// The custom prompt template does not parse
    #[error("Invalid prompt template: {0}")]
    Template(#[from] PromptError),

    /// The completion provider could not be constructed
    #[error("Completion provider error: {0}")]
    Completion(#[from] LLMError),

    /// An HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

//! OpenAI-compatible chat completions provider
//!
//! Speaks the `/chat/completions` wire format, which Groq, OpenAI and most
//! local inference servers share. Groq is the default deployment.
//! See: https://console.groq.com/docs/openai
//!
//! # Examples
//!
//! ```no_run
//! use finsight_llm::{CompletionRequest, Message, LLMProvider};
//! use finsight_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OpenAIProvider::with_config(OpenAIConfig::groq("gsk_..."))?;
//!
//!     let request = CompletionRequest::builder("llama-3.3-70b-versatile")
//!         .add_message(Message::user("Hello!"))
//!         .max_tokens(100)
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.message.content);
//!     Ok(())
//! }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, StopReason,
    TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Groq's OpenAI-compatible endpoint
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
/// OpenAI's endpoint
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for an OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// Base URL, without the trailing `/chat/completions`
    pub api_base: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Name reported by [`LLMProvider::name`]
    pub label: String,
}

impl OpenAIConfig {
    /// Create a config for Groq with the given key
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: GROQ_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            label: "groq".to_string(),
        }
    }

    /// Create a config for OpenAI with the given key
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            label: "openai".to_string(),
        }
    }

    /// Set custom API base URL
    ///
    /// The label is derived from the host unless it is one of the known
    /// endpoints.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self.label = label_for(&self.api_base);
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

fn label_for(api_base: &str) -> String {
    if api_base.contains("groq.com") {
        "groq".to_string()
    } else if api_base.contains("openai.com") {
        "openai".to_string()
    } else {
        "openai-compatible".to_string()
    }
}

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a new provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(format!(
                "API key for {} is empty",
                config.label
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, provider = %self.config.label))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to {}", self.config.api_base);

        let wire_request = ChatRequest::from_request(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&wire_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(error_text),
                400 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(request.model),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        body.into_completion()
    }

    fn name(&self) -> &str {
        &self.config.label
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

impl ChatRequest {
    /// System prompt goes first in the messages array
    fn from_request(request: &CompletionRequest) -> Self {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: Some(system.clone()),
            });
        }

        messages.extend(request.messages.iter().map(|m| ChatMessage {
            role: m.role.as_str().to_string(),
            content: Some(m.content.clone()),
        }));

        Self {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stop: request.stop_sequences.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

impl ChatResponse {
    fn into_completion(self) -> Result<CompletionResponse> {
        let usage = self.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        // OpenAI can return multiple choices but we request one
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        let stop_reason = map_stop_reason(choice.finish_reason.as_deref().unwrap_or("stop"));

        debug!(
            "Received response - stop_reason: {:?}, tokens: {}/{}",
            stop_reason, usage.input_tokens, usage.output_tokens
        );

        Ok(CompletionResponse {
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            stop_reason,
            usage,
        })
    }
}

/// Map the wire stop reason to ours
fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "content_filter" => StopReason::ContentFilter,
        _ => {
            debug!("Unknown stop reason: {}", reason);
            StopReason::EndTurn
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for completion providers
///
/// Implementations send one request and return one response. They do not
/// retry; callers decide what a failure means.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    ///
    /// # Arguments
    ///
    /// * `request` - The completion request with messages and sampling parameters
    ///
    /// # Returns
    ///
    /// The completion response with the assistant's message and metadata
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "groq", "openai")
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompletionRequest, CompletionResponse, LLMError, Message};
    use std::sync::Arc;

    #[test]
    fn test_provider_as_trait_object() {
        let mut mock = MockLLMProvider::new();
        mock.expect_name().return_const("stub".to_string());
        mock.expect_complete()
            .times(1)
            .returning(|req| Ok(CompletionResponse::text(format!("echo: {}", req.messages[0].content))));

        let provider: Arc<dyn LLMProvider> = Arc::new(mock);
        let request = CompletionRequest::builder("m")
            .add_message(Message::user("ping"))
            .build();

        let response = tokio_test::block_on(provider.complete(request)).unwrap();
        assert_eq!(response.message.content, "echo: ping");
        assert_eq!(provider.name(), "stub");
    }

    #[test]
    fn test_provider_error_passthrough() {
        let mut mock = MockLLMProvider::new();
        mock.expect_complete()
            .returning(|_| Err(LLMError::AuthenticationFailed));

        let result = tokio_test::block_on(mock.complete(CompletionRequest::builder("m").build()));
        assert!(result.is_err_and(|e| e.is_auth()));
    }
}

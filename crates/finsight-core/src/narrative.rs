//! Narrative Generator: quote and results in, analyst prose out

use crate::config::{ENV_GROQ_API_KEY, NarrativeConfig};
use crate::error::{ProviderError, Result, with_timeout};
use crate::model::{NarrativeResult, QuoteRecord, SearchResult};
use crate::prompts::{NarrativePrompt, user_template};
use finsight_llm::{CompletionRequest, LLMProvider, Message};
use finsight_prompt::JinjaTemplate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Renders the analysis prompt and asks the completion provider for prose
pub struct NarrativeGenerator {
    /// `None` when no completion key is configured
    provider: Option<Arc<dyn LLMProvider>>,
    template: JinjaTemplate,
    model: String,
    temperature: f32,
    max_tokens: usize,
    timeout: Duration,
}

impl NarrativeGenerator {
    pub fn new(
        provider: Option<Arc<dyn LLMProvider>>,
        config: &NarrativeConfig,
        timeout: Duration,
    ) -> finsight_prompt::Result<Self> {
        Ok(Self {
            provider,
            template: user_template(config.user_template.as_deref())?,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout,
        })
    }

    /// Prompt text for these inputs
    pub fn prompt(&self, quote: &QuoteRecord, results: &[SearchResult]) -> Result<NarrativePrompt> {
        Ok(NarrativePrompt::render(&self.template, quote, results)?)
    }

    /// The exact request sent to the completion provider
    pub fn build_request(&self, quote: &QuoteRecord, results: &[SearchResult]) -> Result<CompletionRequest> {
        let prompt = self.prompt(quote, results)?;
        Ok(CompletionRequest::builder(&self.model)
            .system(prompt.system)
            .add_message(Message::user(prompt.user))
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build())
    }

    /// Generate, reporting why it failed
    ///
    /// A reply with no text counts as a failure.
    pub async fn try_generate(&self, quote: &QuoteRecord, results: &[SearchResult]) -> Result<String> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| ProviderError::MissingCredential(ENV_GROQ_API_KEY.to_string()))?;

        let request = self.build_request(quote, results)?;
        let name = provider.name().to_string();

        let response = with_timeout(&name, self.timeout, async {
            provider.complete(request).await.map_err(ProviderError::from)
        })
        .await?;

        let text = response
            .message
            .text()
            .map(ToString::to_string)
            .ok_or_else(|| ProviderError::malformed(&name, "completion contained no text"))?;

        info!(
            "Generated narrative for {} ({} output tokens)",
            quote.ticker, response.usage.output_tokens
        );
        Ok(text)
    }

    /// Generate, or the fixed fallback when anything goes wrong
    pub async fn generate(&self, quote: &QuoteRecord, results: &[SearchResult]) -> NarrativeResult {
        self.generate_reporting(quote, results, |_| {}).await
    }

    /// Like [`generate`](Self::generate), handing any failure to `on_error`
    pub async fn generate_reporting(
        &self,
        quote: &QuoteRecord,
        results: &[SearchResult],
        on_error: impl FnOnce(&ProviderError),
    ) -> NarrativeResult {
        match self.try_generate(quote, results).await {
            Ok(text) => NarrativeResult::Generated(text),
            Err(e) => {
                warn!("Narrative generation failed for {}: {e}", quote.ticker);
                on_error(&e);
                NarrativeResult::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, MarketCap, NARRATIVE_FALLBACK, Price};
    use async_trait::async_trait;
    use finsight_llm::{CompletionResponse, LLMError};
    use std::sync::Mutex;

    mockall::mock! {
        Completion {}

        #[async_trait]
        impl LLMProvider for Completion {
            async fn complete(&self, request: CompletionRequest) -> finsight_llm::Result<finsight_llm::CompletionResponse>;
            fn name(&self) -> &str;
        }
    }

    /// Replies with fixed text and keeps every request it saw
    struct RecordingProvider {
        reply: String,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl RecordingProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for RecordingProvider {
        async fn complete(&self, request: CompletionRequest) -> finsight_llm::Result<CompletionResponse> {
            self.requests.lock().unwrap().push(request);
            Ok(CompletionResponse::text(self.reply.clone()))
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn quote() -> QuoteRecord {
        let mut quote = QuoteRecord::empty("AAPL");
        quote.company_name = Field::Value("Apple Inc.".to_string());
        quote.current_price = Field::Value(Price(190.12));
        quote.market_cap = Field::Value(MarketCap(3_000_000_000_000));
        quote
    }

    fn results() -> Vec<SearchResult> {
        ["Apple beats estimates", "Services revenue hits record"]
            .into_iter()
            .map(|title| SearchResult::new(Some(title.to_string()), None, None, None, None))
            .collect()
    }

    fn generator(provider: Option<Arc<dyn LLMProvider>>) -> NarrativeGenerator {
        NarrativeGenerator::new(provider, &NarrativeConfig::default(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_completion_text() {
        let provider = Arc::new(RecordingProvider::new("OK"));
        let generator = generator(Some(provider.clone()));

        let narrative = generator.generate(&quote(), &results()).await;
        assert_eq!(narrative, "OK");

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let user = requests[0].messages[0].content.as_str();
        assert!(user.contains("Apple beats estimates"));
        assert!(user.contains("Services revenue hits record"));
    }

    #[tokio::test]
    async fn test_request_parameters() {
        let provider = Arc::new(RecordingProvider::new("OK"));
        let generator = generator(Some(provider.clone()));
        generator.generate(&quote(), &[]).await;

        let requests = provider.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.model, crate::config::DEFAULT_MODEL);
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, 1000);
        assert!(request.system.as_deref().unwrap().starts_with("You are an objective financial analyst."));
    }

    #[tokio::test]
    async fn test_generate_is_prompt_identical() {
        let provider = Arc::new(RecordingProvider::new("OK"));
        let generator = generator(Some(provider.clone()));

        generator.generate(&quote(), &results()).await;
        generator.generate(&quote(), &results()).await;

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0], requests[1]);
        assert_eq!(
            serde_json::to_string(&requests[0]).unwrap(),
            serde_json::to_string(&requests[1]).unwrap()
        );
    }

    #[tokio::test]
    async fn test_provider_error_returns_fallback() {
        let mut mock = MockCompletion::new();
        mock.expect_name().return_const("mock".to_string());
        mock.expect_complete()
            .times(1)
            .returning(|_| Err(LLMError::RateLimitExceeded("slow down".to_string())));

        let narrative = generator(Some(Arc::new(mock))).generate(&quote(), &results()).await;
        assert_eq!(narrative, NarrativeResult::Unavailable);
        assert_eq!(narrative.text(), NARRATIVE_FALLBACK);
    }

    #[tokio::test]
    async fn test_failure_handed_to_callback() {
        let mut seen = None;
        let narrative = generator(None)
            .generate_reporting(&quote(), &[], |e| seen = Some(e.to_string()))
            .await;

        assert_eq!(narrative, NarrativeResult::Unavailable);
        assert_eq!(seen.as_deref(), Some("Missing credential: GROQ_API_KEY is not set"));
    }

    #[tokio::test]
    async fn test_empty_completion_returns_fallback() {
        let provider = Arc::new(RecordingProvider::new("   "));
        let generator = generator(Some(provider));

        assert!(matches!(
            generator.try_generate(&quote(), &[]).await,
            Err(ProviderError::MalformedResponse { .. })
        ));
        assert_eq!(generator.generate(&quote(), &[]).await, NarrativeResult::Unavailable);
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let generator = generator(None);

        assert!(matches!(
            generator.try_generate(&quote(), &[]).await,
            Err(ProviderError::MissingCredential(name)) if name == "GROQ_API_KEY"
        ));
        assert_eq!(generator.generate(&quote(), &[]).await, NarrativeResult::Unavailable);
    }

    #[test]
    fn test_build_request_without_provider() {
        let generator = generator(None);
        let request = generator.build_request(&quote(), &[]).unwrap();
        assert_eq!(request.messages.len(), 1);
        assert!(request.messages[0].content.contains("No recent news found."));
    }
}

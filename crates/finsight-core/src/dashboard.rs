//! The request pipeline: quote, news, then narrative
//!
//! Failures never escape [`Dashboard::analyze_ticker`]. Each one is logged,
//! replaced with the component's safe default and recorded as a [`Notice`]
//! for the presentation layer.

use crate::api::{
    FinnhubNewsClient, GoogleSearchClient, MarketDataProvider, SearchProvider, SerperNewsClient,
    UnconfiguredSearch, YahooFinanceClient, finnhub,
};
use crate::config::{
    CredentialUpdate, ENV_FINNHUB_API_KEY, ENV_GOOGLE_API_KEY, ENV_GOOGLE_ENGINE_ID,
    ENV_SERPER_API_KEY, FinsightConfig, SearchProviderKind,
};
use crate::error::ConfigError;
use crate::model::{NarrativeResult, QuoteRecord, SearchResult};
use crate::narrative::NarrativeGenerator;
use crate::news::{NewsFetcher, ticker_query};
use crate::quote::QuoteFetcher;
use finsight_llm::LLMProvider;
use finsight_llm::providers::{OpenAIConfig, OpenAIProvider};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Severity of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message to show alongside a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Everything produced for one ticker
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub ticker: String,
    pub quote: Option<QuoteRecord>,
    pub results: Vec<SearchResult>,
    /// `None` when generation was skipped
    pub narrative: Option<NarrativeResult>,
    pub notices: Vec<Notice>,
}

impl DashboardReport {
    fn new(ticker: String) -> Self {
        Self {
            ticker,
            quote: None,
            results: Vec::new(),
            narrative: None,
            notices: Vec::new(),
        }
    }
}

/// Results of a free-text search
#[derive(Debug, Clone, Serialize)]
pub struct NewsReport {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub notices: Vec<Notice>,
}

/// The three components wired to one configuration
pub struct Dashboard {
    config: FinsightConfig,
    quotes: QuoteFetcher,
    news: NewsFetcher,
    narrator: NarrativeGenerator,
}

impl Dashboard {
    /// Assemble a dashboard from already-built components
    pub fn new(
        config: FinsightConfig,
        quotes: QuoteFetcher,
        news: NewsFetcher,
        narrator: NarrativeGenerator,
    ) -> Self {
        Self {
            config,
            quotes,
            news,
            narrator,
        }
    }

    /// Build the live providers for a configuration
    ///
    /// Missing credentials do not fail here; the affected component reports
    /// them when it is used.
    pub fn from_config(config: FinsightConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let timeout = config.request_timeout;

        let market: Arc<dyn MarketDataProvider> = Arc::new(YahooFinanceClient::new(timeout)?);
        let quotes = QuoteFetcher::new(market, &config.market, timeout);
        let news = NewsFetcher::new(search_provider(&config)?, timeout);
        let narrator = NarrativeGenerator::new(completion_provider(&config)?, &config.narrative, timeout)?;

        info!(
            "Dashboard ready: search via {}, model {}",
            news.provider_name(),
            config.narrative.model
        );
        Ok(Self::new(config, quotes, news, narrator))
    }

    pub fn config(&self) -> &FinsightConfig {
        &self.config
    }

    /// A new dashboard with one credential replaced
    pub fn reconfigure(&self, update: CredentialUpdate) -> Result<Self, ConfigError> {
        info!("Replacing {}", update.env_name());
        Self::from_config(self.config.reconfigure(update))
    }

    /// A new dashboard using another search backend
    pub fn with_search_provider(&self, provider: SearchProviderKind) -> Result<Self, ConfigError> {
        Self::from_config(self.config.with_search_provider(provider))
    }

    /// Quote, news and narrative for one ticker
    ///
    /// An absent quote skips the narrative; an empty or failed search does not.
    pub async fn analyze_ticker(&self, ticker: &str) -> DashboardReport {
        let mut report = DashboardReport::new(ticker.trim().to_uppercase());
        if report.ticker.is_empty() {
            report.notices.push(Notice::warning("Please enter a stock ticker."));
            return report;
        }

        let ticker = &report.ticker;
        let notices = &mut report.notices;
        report.quote = self
            .quotes
            .fetch_quote_reporting(ticker, |e| {
                notices.push(Notice::error(format!(
                    "Unable to retrieve stock information for {ticker}: {e}"
                )));
            })
            .await;

        let query = ticker_query(&report.ticker);
        report.results = self.collect_results(&query, &mut report.notices).await;

        match &report.quote {
            Some(quote) => {
                let notices = &mut report.notices;
                let narrative = self
                    .narrator
                    .generate_reporting(quote, &report.results, |e| {
                        notices.push(Notice::warning(format!("AI insights unavailable: {e}")));
                    })
                    .await;
                report.narrative = Some(narrative);
            }
            None => report.notices.push(Notice::warning(
                "Unable to generate analysis. Please verify the stock ticker.",
            )),
        }

        report
    }

    /// News and web results for a free-text query
    pub async fn search_news(&self, query: &str) -> NewsReport {
        let mut notices = Vec::new();
        let results = if query.trim().is_empty() {
            notices.push(Notice::warning("Please enter a search query."));
            Vec::new()
        } else {
            self.collect_results(query.trim(), &mut notices).await
        };

        NewsReport {
            query: query.trim().to_string(),
            results,
            notices,
        }
    }

    async fn collect_results(&self, query: &str, notices: &mut Vec<Notice>) -> Vec<SearchResult> {
        let provider = self.news.provider_name();
        let mut failed = false;
        let results = self
            .news
            .fetch_results_reporting(query, self.config.search.max_results, |e| {
                failed = true;
                notices.push(Notice::warning(format!("News search via {provider} failed: {e}")));
            })
            .await;

        if results.is_empty() && !failed {
            notices.push(Notice::info(format!("No news found for '{query}'.")));
        }
        results
    }
}

fn search_provider(config: &FinsightConfig) -> Result<Arc<dyn SearchProvider>, ConfigError> {
    let credentials = &config.credentials;
    let timeout = config.request_timeout;
    let kind = config.search.provider;

    let provider: Arc<dyn SearchProvider> = match kind {
        SearchProviderKind::GoogleCustomSearch => {
            match (&credentials.google_api_key, &credentials.google_engine_id) {
                (Some(key), Some(engine_id)) => Arc::new(GoogleSearchClient::new(
                    key,
                    engine_id,
                    &config.search,
                    timeout,
                )?),
                (None, _) => Arc::new(UnconfiguredSearch::new(kind.as_str(), ENV_GOOGLE_API_KEY)),
                (Some(_), None) => Arc::new(UnconfiguredSearch::new(kind.as_str(), ENV_GOOGLE_ENGINE_ID)),
            }
        }
        SearchProviderKind::SerperNews => match &credentials.serper_api_key {
            Some(key) => Arc::new(SerperNewsClient::new(key, timeout)?),
            None => Arc::new(UnconfiguredSearch::new(kind.as_str(), ENV_SERPER_API_KEY)),
        },
        SearchProviderKind::FinnhubNews => match &credentials.finnhub_api_key {
            Some(key) => Arc::new(FinnhubNewsClient::new(
                key,
                finnhub::DEFAULT_RATE_LIMIT,
                timeout,
            )?),
            None => Arc::new(UnconfiguredSearch::new(kind.as_str(), ENV_FINNHUB_API_KEY)),
        },
    };
    Ok(provider)
}

fn completion_provider(config: &FinsightConfig) -> Result<Option<Arc<dyn LLMProvider>>, ConfigError> {
    let Some(key) = &config.credentials.completion_api_key else {
        return Ok(None);
    };

    let mut llm_config = OpenAIConfig::groq(key).with_timeout(config.request_timeout.as_secs());
    if let Some(base) = &config.narrative.api_base {
        llm_config = llm_config.with_api_base(base);
    }

    let provider: Arc<dyn LLMProvider> = Arc::new(OpenAIProvider::with_config(llm_config)?);
    Ok(Some(provider))
}

//! Finnhub company-news client

use super::SearchProvider;
use crate::config::MAX_RESULTS_LIMIT;
use crate::error::{ProviderError, Result};
use crate::model::SearchResult;
use crate::news::ticker_query;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use url::Url;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const PROVIDER: &str = "finnhub";
const COMPANY_NEWS_URL: &str = "https://finnhub.io/api/v1/company-news";

/// Free-tier requests per minute
pub const DEFAULT_RATE_LIMIT: NonZeroU32 = NonZeroU32::MIN.saturating_add(59);

/// Days of news requested
const LOOKBACK_DAYS: i64 = 30;

/// Finnhub news article
#[derive(Debug, Clone, Deserialize)]
pub struct FinnhubNewsArticle {
    /// Publish time (UNIX timestamp)
    #[serde(default)]
    pub datetime: i64,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: String,
}

impl From<FinnhubNewsArticle> for SearchResult {
    fn from(article: FinnhubNewsArticle) -> Self {
        let date = DateTime::from_timestamp(article.datetime, 0)
            .filter(|_| article.datetime > 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string());

        SearchResult::new(
            Some(article.headline),
            Some(article.summary),
            Some(article.source),
            Some(article.url),
            date,
        )
    }
}

/// Finnhub client for company news
///
/// Finnhub indexes news by symbol, so queries must name a single ticker.
/// Requests are rate limited client-side.
pub struct FinnhubNewsClient {
    http: Client,
    timeout: Duration,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl FinnhubNewsClient {
    /// Create a new Finnhub client
    ///
    /// # Arguments
    /// * `api_key` - Finnhub API key
    /// * `rate_limit` - Requests per minute (free tier: 60)
    pub fn new(api_key: impl Into<String>, rate_limit: NonZeroU32, timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            timeout,
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(rate_limit))),
        })
    }

    /// Get company news for a symbol between two dates (inclusive)
    pub async fn company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<FinnhubNewsArticle>> {
        self.rate_limiter.until_ready().await;

        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        let url = Url::parse_with_params(
            COMPANY_NEWS_URL,
            &[
                ("symbol", symbol),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("token", self.api_key.as_str()),
            ],
        )
        .map_err(|e| ProviderError::InvalidInput(format!("Bad symbol '{symbol}': {e}")))?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::request(PROVIDER, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(PROVIDER, status, &body));
        }

        response
            .json::<Vec<FinnhubNewsArticle>>()
            .await
            .map_err(|e| ProviderError::malformed(PROVIDER, format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl SearchProvider for FinnhubNewsClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let symbol = symbol_from_query(query)?;
        let to = Utc::now().date_naive();
        let from = to - chrono::Duration::days(LOOKBACK_DAYS);

        let articles = self.company_news(&symbol, from, to).await?;

        Ok(articles
            .into_iter()
            .take(max_results.min(MAX_RESULTS_LIMIT))
            .map(SearchResult::from)
            .collect())
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// Ticker symbol carried by the query
///
/// Only a lone ticker or the dashboard's ticker query qualify. Free text is
/// rejected rather than guessed at, since its first word is rarely a symbol.
fn symbol_from_query(query: &str) -> Result<String> {
    let words: Vec<&str> = query.split_whitespace().collect();
    let candidate = match words.as_slice() {
        [single] => Some(*single),
        [first, ..] if query.trim().eq_ignore_ascii_case(&ticker_query(first)) => Some(*first),
        _ => None,
    };

    match candidate.filter(|c| looks_like_symbol(c)) {
        Some(symbol) => Ok(symbol.to_uppercase()),
        None => Err(ProviderError::InvalidInput(format!(
            "Finnhub searches by ticker; '{}' is not a ticker symbol",
            query.trim()
        ))),
    }
}

fn looks_like_symbol(candidate: &str) -> bool {
    candidate.len() <= 10
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = FinnhubNewsClient::new("test_key", DEFAULT_RATE_LIMIT, Duration::from_secs(5)).unwrap();
        assert_eq!(client.api_key, "test_key");
        assert_eq!(client.name(), "finnhub");
    }

    #[test]
    fn test_symbol_from_query() {
        assert_eq!(
            symbol_from_query("aapl stock analysis latest financial insights").unwrap(),
            "AAPL"
        );
        assert_eq!(symbol_from_query("BRK.B").unwrap(), "BRK.B");
        assert_eq!(symbol_from_query(" msft ").unwrap(), "MSFT");
        assert!(symbol_from_query("   ").is_err());
        assert!(symbol_from_query("what's happening with chips").is_err());
    }

    #[test]
    fn test_free_text_is_not_a_symbol() {
        for query in ["chip export rules", "fed rate decision", "AAPL earnings call"] {
            assert!(
                matches!(symbol_from_query(query), Err(ProviderError::InvalidInput(_))),
                "{query} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_free_text_search_fails_before_any_request() {
        let client = FinnhubNewsClient::new("test_key", DEFAULT_RATE_LIMIT, Duration::from_secs(5)).unwrap();
        let result = client.search("chip export rules", 5).await;
        assert!(matches!(result, Err(ProviderError::InvalidInput(_))));
    }

    #[test]
    fn test_article_conversion() {
        let article: FinnhubNewsArticle = serde_json::from_str(
            r#"{
                "category": "company",
                "datetime": 1714680000,
                "headline": "Apple buyback",
                "id": 1,
                "image": "",
                "related": "AAPL",
                "source": "Reuters",
                "summary": "Apple announced...",
                "url": "https://example.com/buyback"
            }"#,
        )
        .unwrap();

        let result = SearchResult::from(article);
        assert_eq!(result.title, "Apple buyback");
        assert_eq!(result.source, "Reuters");
        assert_eq!(result.date, "2024-05-02");
    }

    #[test]
    fn test_article_without_timestamp() {
        let article: FinnhubNewsArticle = serde_json::from_str(r#"{ "headline": "x" }"#).unwrap();
        let result = SearchResult::from(article);
        assert_eq!(result.date, "N/A");
        assert_eq!(result.link, "N/A");
    }

    #[tokio::test]
    #[ignore] // Requires FINNHUB_API_KEY
    async fn test_live_company_news() {
        let key = std::env::var("FINNHUB_API_KEY").unwrap();
        let client = FinnhubNewsClient::new(key, DEFAULT_RATE_LIMIT, Duration::from_secs(30)).unwrap();
        let results = client.search("AAPL", 3).await.unwrap();
        assert!(results.len() <= 3);
    }
}

//! Provider seams and their HTTP implementations
//!
//! The fetchers only talk to [`MarketDataProvider`] and [`SearchProvider`];
//! tests substitute mocks for both.

pub mod finnhub;
pub mod google;
pub mod serper;
pub mod yahoo;

pub use finnhub::FinnhubNewsClient;
pub use google::GoogleSearchClient;
pub use serper::SerperNewsClient;
pub use yahoo::YahooFinanceClient;

use crate::config::{HistoryRange, MAX_RESULTS_LIMIT};
use crate::error::{ProviderError, Result};
use crate::model::{PriceBar, SearchResult};
use async_trait::async_trait;

/// Raw key/value quote information as returned by the market-data provider
pub type InfoMap = serde_json::Map<String, serde_json::Value>;

/// Source of quote information and price history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Current quote information for an upper-cased ticker
    async fn quote_info(&self, ticker: &str) -> Result<InfoMap>;

    /// Trailing price history, oldest bar first
    async fn price_history(&self, ticker: &str, range: HistoryRange) -> Result<Vec<PriceBar>>;

    /// Provider name for logs and errors
    fn name(&self) -> &str;
}

/// Source of news and web results
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Up to `max_results` results, in the provider's ranking order
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;

    /// Provider name for logs and errors
    fn name(&self) -> &str;

    /// Most results the provider returns for one request
    fn max_results_ceiling(&self) -> usize {
        MAX_RESULTS_LIMIT
    }
}

/// Stand-in for a search backend whose credential is not configured
///
/// Every call fails with [`ProviderError::MissingCredential`], so a missing
/// key is reported like any other provider failure.
#[derive(Debug, Clone)]
pub struct UnconfiguredSearch {
    provider: &'static str,
    credential: &'static str,
}

impl UnconfiguredSearch {
    pub fn new(provider: &'static str, credential: &'static str) -> Self {
        Self {
            provider,
            credential,
        }
    }
}

#[async_trait]
impl SearchProvider for UnconfiguredSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
        Err(ProviderError::MissingCredential(self.credential.to_string()))
    }

    fn name(&self) -> &str {
        self.provider
    }
}

/// Read a non-empty string from a JSON object
pub(crate) fn json_str(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unconfigured_search_reports_missing_credential() {
        let provider = UnconfiguredSearch::new("serper", "SERPER_API_KEY");
        let err = provider.search("AAPL", 5).await.unwrap_err();

        assert!(matches!(err, ProviderError::MissingCredential(ref name) if name == "SERPER_API_KEY"));
        assert_eq!(provider.name(), "serper");
        assert_eq!(provider.max_results_ceiling(), MAX_RESULTS_LIMIT);
    }

    #[test]
    fn test_json_str() {
        let value = json!({ "title": " Apple ", "empty": "", "number": 3 });
        assert_eq!(json_str(&value, "title").as_deref(), Some("Apple"));
        assert_eq!(json_str(&value, "empty"), None);
        assert_eq!(json_str(&value, "number"), None);
        assert_eq!(json_str(&value, "missing"), None);
    }
}

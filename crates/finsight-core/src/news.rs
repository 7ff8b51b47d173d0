//! News/Context Fetcher: query in, ordered [`SearchResult`] list out

use crate::api::SearchProvider;
use crate::error::{ProviderError, Result, with_timeout};
use crate::model::SearchResult;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Results requested when the caller does not say otherwise
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Query used to gather context for a ticker
pub fn ticker_query(ticker: &str) -> String {
    format!(
        "{} stock analysis latest financial insights",
        ticker.trim().to_uppercase()
    )
}

/// Fetches news and web results from one search provider
pub struct NewsFetcher {
    provider: Arc<dyn SearchProvider>,
    timeout: Duration,
}

impl NewsFetcher {
    pub fn new(provider: Arc<dyn SearchProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Requested count clamped to what the provider can return
    pub fn clamp_max_results(&self, max_results: usize) -> usize {
        max_results.min(self.provider.max_results_ceiling())
    }

    /// Search, reporting why it failed
    ///
    /// Results keep the provider's order and never exceed the clamped count.
    pub async fn try_fetch_results(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ProviderError::InvalidInput("search query is empty".to_string()));
        }

        let limit = self.clamp_max_results(max_results);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut results = with_timeout(
            self.provider.name(),
            self.timeout,
            self.provider.search(query, limit),
        )
        .await?;
        results.truncate(limit);

        info!(
            "{} returned {} results for '{query}'",
            self.provider.name(),
            results.len()
        );
        Ok(results)
    }

    /// Search, or an empty list when anything goes wrong
    pub async fn fetch_results(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        self.fetch_results_reporting(query, max_results, |_| {}).await
    }

    /// Like [`fetch_results`](Self::fetch_results), handing any failure to `on_error`
    ///
    /// The return shape is the same for a failure and for "no news"; only the
    /// callback tells them apart.
    pub async fn fetch_results_reporting(
        &self,
        query: &str,
        max_results: usize,
        on_error: impl FnOnce(&ProviderError),
    ) -> Vec<SearchResult> {
        match self.try_fetch_results(query, max_results).await {
            Ok(results) => results,
            Err(e) => {
                warn!("News search failed for '{query}': {e}");
                on_error(&e);
                Vec::new()
            }
        }
    }
}

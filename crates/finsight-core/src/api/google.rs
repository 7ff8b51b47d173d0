//! Google Programmable Search (Custom Search JSON API) client

use super::{SearchProvider, json_str};
use crate::config::{MAX_RESULTS_LIMIT, SearchConfig};
use crate::error::{ProviderError, Result};
use crate::model::SearchResult;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::instrument;
use url::Url;

const PROVIDER: &str = "google";
const SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Metatags that commonly carry a publication date
const DATE_METATAGS: [&str; 3] = ["article:published_time", "og:updated_time", "date"];

/// Google Custom Search client
pub struct GoogleSearchClient {
    http: Client,
    timeout: Duration,
    api_key: String,
    engine_id: String,
    recent_first: bool,
    site_allow_list: Vec<String>,
    date_restrict: Option<String>,
}

impl GoogleSearchClient {
    pub fn new(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        config: &SearchConfig,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            timeout,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            recent_first: config.recent_first,
            site_allow_list: config.site_allow_list.clone(),
            date_restrict: config.date_restrict.clone(),
        })
    }

    /// Request URL for a query
    ///
    /// The API's `siteSearch` takes a single site, so an allow-list is folded
    /// into the query as `site:` operators.
    fn request_url(&self, query: &str, max_results: usize) -> Result<Url> {
        let q = scoped_query(query, &self.site_allow_list);
        let num = max_results.clamp(1, MAX_RESULTS_LIMIT).to_string();

        let mut params = vec![
            ("key", self.api_key.as_str()),
            ("cx", self.engine_id.as_str()),
            ("q", q.as_str()),
            ("num", num.as_str()),
        ];
        if self.recent_first {
            params.push(("sort", "date"));
        }
        if let Some(restrict) = &self.date_restrict {
            params.push(("dateRestrict", restrict.as_str()));
        }

        Url::parse_with_params(SEARCH_URL, &params)
            .map_err(|e| ProviderError::InvalidInput(format!("Bad search query: {e}")))
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let url = self.request_url(query, max_results)?;

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

        let payload = response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::malformed(PROVIDER, e.to_string()))?;

        Ok(parse_items(&payload))
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

fn scoped_query(query: &str, sites: &[String]) -> String {
    if sites.is_empty() {
        return query.to_string();
    }
    let scope = sites
        .iter()
        .map(|site| format!("site:{site}"))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("{query} ({scope})")
}

/// Map `items` to results; a response without items means no hits
fn parse_items(payload: &Value) -> Vec<SearchResult> {
    let Some(items) = payload.get("items").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| {
            SearchResult::new(
                json_str(item, "title"),
                json_str(item, "snippet"),
                json_str(item, "displayLink"),
                json_str(item, "link"),
                published_date(item),
            )
        })
        .collect()
}

fn published_date(item: &Value) -> Option<String> {
    let tags = item.pointer("/pagemap/metatags/0")?;
    DATE_METATAGS
        .iter()
        .find_map(|tag| json_str(tags, tag))
        .map(|date| date.chars().take(10).collect())
}

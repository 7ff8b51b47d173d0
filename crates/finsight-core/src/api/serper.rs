//! Serper news search client

use super::{SearchProvider, json_str};
use crate::config::MAX_RESULTS_LIMIT;
use crate::error::{ProviderError, Result};
use crate::model::SearchResult;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::instrument;

const PROVIDER: &str = "serper";
const NEWS_URL: &str = "https://google.serper.dev/news";

#[derive(Debug, Serialize)]
struct NewsRequest<'a> {
    q: &'a str,
    num: usize,
}

/// Serper (google.serper.dev) news client
pub struct SerperNewsClient {
    http: Client,
    timeout: Duration,
    api_key: String,
}

impl SerperNewsClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            timeout,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl SearchProvider for SerperNewsClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let body = NewsRequest {
            q: query,
            num: max_results.clamp(1, MAX_RESULTS_LIMIT),
        };

        let response = self
            .http
            .post(NEWS_URL)
            .header("X-API-KEY", &self.api_key)
            .json(&body)
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

        parse_news(&payload)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

fn parse_news(payload: &Value) -> Result<Vec<SearchResult>> {
    let news = payload
        .get("news")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::malformed(PROVIDER, "missing news array"))?;

    Ok(news
        .iter()
        .map(|item| {
            SearchResult::new(
                json_str(item, "title"),
                json_str(item, "snippet"),
                json_str(item, "source"),
                json_str(item, "link"),
                json_str(item, "date"),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_news() {
        let payload = json!({
            "searchParameters": { "q": "AAPL", "type": "news" },
            "news": [
                {
                    "title": "Apple unveils new chips",
                    "link": "https://example.com/chips",
                    "snippet": "The company said...",
                    "date": "2 hours ago",
                    "source": "Bloomberg"
                },
                { "title": "Untitled follow-up" }
            ]
        });

        let results = parse_news(&payload).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "Bloomberg");
        assert_eq!(results[0].date, "2 hours ago");
        assert_eq!(results[1].link, "N/A");
    }

    #[test]
    fn test_parse_news_malformed() {
        assert!(matches!(
            parse_news(&json!({ "message": "Unauthorized." })),
            Err(ProviderError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_request_body() {
        let body = NewsRequest { q: "NVDA", num: 5 };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "q": "NVDA", "num": 5 }));
    }

    #[tokio::test]
    #[ignore] // Requires SERPER_API_KEY
    async fn test_live_search() {
        let key = std::env::var("SERPER_API_KEY").unwrap();
        let client = SerperNewsClient::new(key, Duration::from_secs(30)).unwrap();
        let results = client.search("NVDA stock", 3).await.unwrap();
        assert!(results.len() <= 3);
    }
}

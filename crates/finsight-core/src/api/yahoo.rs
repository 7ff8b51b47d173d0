//! Yahoo Finance market-data client
//!
//! Quote information comes from the v7 quote endpoint, which needs a session
//! cookie plus a crumb token. Price history goes through `yahoo_finance_api`.

use super::{InfoMap, MarketDataProvider};
use crate::config::HistoryRange;
use crate::error::{ProviderError, Result};
use crate::model::PriceBar;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, instrument};
use url::Url;
use yahoo_finance_api as yahoo;

const PROVIDER: &str = "yahoo";

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_ENDPOINTS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";
const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary/";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Yahoo Finance client
pub struct YahooFinanceClient {
    http: Client,
    timeout: Duration,
}

impl YahooFinanceClient {
    /// Create a client whose HTTP calls give up after `timeout`
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, timeout })
    }

    /// Establish a session cookie and fetch a crumb for it
    async fn crumb(&self) -> Result<String> {
        // fc.yahoo.com answers 404 but still sets the cookie
        self.http
            .get(COOKIE_URL)
            .send()
            .await
            .map_err(|e| ProviderError::request(PROVIDER, self.timeout, e))?;

        for endpoint in CRUMB_ENDPOINTS {
            let response = match self.http.get(endpoint).send().await {
                Ok(response) => response,
                Err(e) => {
                    debug!("Crumb request to {endpoint} failed: {e}");
                    continue;
                }
            };

            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 || body.to_lowercase().contains("too many requests") {
                return Err(ProviderError::RateLimited {
                    provider: PROVIDER.to_string(),
                });
            }

            if let Some(crumb) = parse_crumb(&body).filter(|_| status.is_success()) {
                return Ok(crumb);
            }
            debug!("Unusable crumb response from {endpoint} ({status})");
        }

        Err(ProviderError::Authentication {
            provider: PROVIDER.to_string(),
        })
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
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
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::malformed(PROVIDER, e.to_string()))
    }

    /// Sector, industry and valuation extras from the summary endpoint
    async fn summary(&self, ticker: &str, crumb: &str) -> Result<Value> {
        let base = format!("{SUMMARY_URL}{ticker}");
        let url = Url::parse_with_params(
            &base,
            &[("modules", "assetProfile,summaryDetail"), ("crumb", crumb)],
        )
        .map_err(|e| ProviderError::InvalidInput(format!("Bad ticker '{ticker}': {e}")))?;

        self.get_json(url).await
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    #[instrument(skip(self))]
    async fn quote_info(&self, ticker: &str) -> Result<InfoMap> {
        let crumb = self.crumb().await?;

        let url = Url::parse_with_params(QUOTE_URL, &[("symbols", ticker), ("crumb", crumb.as_str())])
            .map_err(|e| ProviderError::InvalidInput(format!("Bad ticker '{ticker}': {e}")))?;
        let payload = self.get_json(url).await?;
        let mut info = extract_quote(&payload, ticker)?;

        // The summary only adds optional fields; a failure leaves them N/A
        match self.summary(ticker, &crumb).await {
            Ok(summary) => merge_summary(&mut info, &summary),
            Err(e) => debug!("Quote summary for {ticker} unavailable: {e}"),
        }

        Ok(info)
    }

    #[instrument(skip(self))]
    async fn price_history(&self, ticker: &str, range: HistoryRange) -> Result<Vec<PriceBar>> {
        let connector = yahoo::YahooConnector::new().map_err(|e| ProviderError::network(PROVIDER, e))?;

        let end = Utc::now();
        let start = lookback_start(range, end);

        // Convert chrono DateTime to time OffsetDateTime
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| ProviderError::malformed(PROVIDER, format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| ProviderError::malformed(PROVIDER, format!("Invalid end timestamp: {e}")))?;

        let response = connector
            .get_quote_history_interval(ticker, start_odt, end_odt, range.interval())
            .await
            .map_err(|e| classify_history_error(ticker, &e))?;

        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(e) => {
                debug!("No price history for {ticker}: {e}");
                return Ok(Vec::new());
            }
        };

        Ok(quotes
            .iter()
            .map(|q| PriceBar {
                timestamp: DateTime::from_timestamp(q.timestamp as i64, 0).unwrap_or_else(Utc::now),
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
            })
            .collect())
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// A crumb is a short plain token; HTML means the session was refused
fn parse_crumb(body: &str) -> Option<String> {
    let crumb = body.trim();
    let plausible = !crumb.is_empty()
        && crumb.len() <= 64
        && !crumb.contains('<')
        && !crumb.contains(char::is_whitespace);
    plausible.then(|| crumb.to_string())
}

/// Pull the single quote object out of a v7 quote payload
fn extract_quote(payload: &Value, ticker: &str) -> Result<InfoMap> {
    let response = payload
        .get("quoteResponse")
        .ok_or_else(|| ProviderError::malformed(PROVIDER, "missing quoteResponse"))?;

    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        return Err(ProviderError::malformed(PROVIDER, error.to_string()));
    }

    response
        .get("result")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| ProviderError::UnknownTicker(ticker.to_string()))
}

/// Copy summary fields the quote payload lacks into `info`
fn merge_summary(info: &mut InfoMap, summary: &Value) {
    let Some(result) = summary
        .pointer("/quoteSummary/result/0")
        .and_then(Value::as_object)
    else {
        return;
    };

    for module in ["assetProfile", "summaryDetail"] {
        let Some(fields) = result.get(module).and_then(Value::as_object) else {
            continue;
        };
        for (key, value) in fields {
            if !info.contains_key(key) && !value.is_null() {
                info.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Start of the lookback window ending at `end`
pub fn lookback_start(range: HistoryRange, end: DateTime<Utc>) -> DateTime<Utc> {
    let days = |n: i64| end - chrono::Duration::days(n);
    match range {
        HistoryRange::OneDay => days(1),
        HistoryRange::FiveDays => days(5),
        HistoryRange::OneMonth => days(30),
        HistoryRange::ThreeMonths => days(90),
        HistoryRange::SixMonths => days(180),
        HistoryRange::OneYear => days(365),
        HistoryRange::TwoYears => days(730),
        HistoryRange::FiveYears => days(1825),
        HistoryRange::TenYears => days(3650),
        HistoryRange::YearToDate => Utc
            .with_ymd_and_hms(end.year(), 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(|| days(365)),
        HistoryRange::Max => DateTime::UNIX_EPOCH,
    }
}

fn classify_history_error(ticker: &str, err: &yahoo::YahooError) -> ProviderError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if lower.contains("404") || lower.contains("not found") || lower.contains("no data") {
        ProviderError::UnknownTicker(ticker.to_string())
    } else {
        ProviderError::network(PROVIDER, message)
    }
}

//! Quote Fetcher: ticker in, normalized [`QuoteRecord`] out

use crate::api::{InfoMap, MarketDataProvider};
use crate::config::{HistoryRange, MarketConfig};
use crate::error::{ProviderError, Result, with_timeout};
use crate::model::{Field, MarketCap, Percent, Price, PriceBar, QuoteRecord, Ratio, Volume};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Fetches and normalizes quote snapshots
pub struct QuoteFetcher {
    provider: Arc<dyn MarketDataProvider>,
    history_range: HistoryRange,
    timeout: Duration,
}

impl QuoteFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: &MarketConfig, timeout: Duration) -> Self {
        Self {
            provider,
            history_range: config.history_range,
            timeout,
        }
    }

    /// Fetch a quote, reporting why it failed
    pub async fn try_fetch_quote(&self, ticker: &str) -> Result<QuoteRecord> {
        let ticker = normalize_ticker(ticker)?;
        let name = self.provider.name().to_string();

        let info = with_timeout(&name, self.timeout, self.provider.quote_info(&ticker)).await?;
        let history = with_timeout(
            &name,
            self.timeout,
            self.provider.price_history(&ticker, self.history_range),
        )
        .await?;

        if !has_price(&info) && history.is_empty() {
            return Err(ProviderError::UnknownTicker(ticker));
        }

        info!("Fetched quote for {ticker} ({} history bars)", history.len());
        Ok(normalize_quote(&ticker, &info, history))
    }

    /// Fetch a quote, or `None` when anything goes wrong
    pub async fn fetch_quote(&self, ticker: &str) -> Option<QuoteRecord> {
        self.fetch_quote_reporting(ticker, |_| {}).await
    }

    /// Like [`fetch_quote`](Self::fetch_quote), handing any failure to `on_error`
    pub async fn fetch_quote_reporting(
        &self,
        ticker: &str,
        on_error: impl FnOnce(&ProviderError),
    ) -> Option<QuoteRecord> {
        match self.try_fetch_quote(ticker).await {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Quote fetch failed for '{ticker}': {e}");
                on_error(&e);
                None
            }
        }
    }
}

/// Trim and upper-case a ticker, rejecting anything that cannot be one
pub fn normalize_ticker(ticker: &str) -> Result<String> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(ProviderError::InvalidInput("ticker is empty".to_string()));
    }

    let valid = ticker.len() <= 16
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if !valid {
        return Err(ProviderError::InvalidInput(format!(
            "'{ticker}' is not a valid ticker symbol"
        )));
    }

    Ok(ticker.to_uppercase())
}

const PRICE_KEYS: [&str; 2] = ["currentPrice", "regularMarketPrice"];

fn has_price(info: &InfoMap) -> bool {
    number(info, &PRICE_KEYS).is_some()
}

/// Build a record from provider info, falling back to the last history bar
pub fn normalize_quote(ticker: &str, info: &InfoMap, history: Vec<PriceBar>) -> QuoteRecord {
    let last_bar = history.last();
    let bar_value = |pick: fn(&PriceBar) -> f64| last_bar.map(|bar| Price(pick(bar)));

    let price = |keys: &[&str]| Field::from(number(info, keys).map(Price));
    let volume = |keys: &[&str]| Field::from(number(info, keys).and_then(whole).map(Volume));

    QuoteRecord {
        ticker: ticker.to_uppercase(),
        company_name: text(info, &["longName", "shortName", "displayName"]).into(),
        current_price: price(&PRICE_KEYS).or(bar_value(|b| b.close).into()),
        previous_close: price(&["previousClose", "regularMarketPreviousClose"]),
        open: price(&["open", "regularMarketOpen"]).or(bar_value(|b| b.open).into()),
        day_high: price(&["dayHigh", "regularMarketDayHigh"]).or(bar_value(|b| b.high).into()),
        day_low: price(&["dayLow", "regularMarketDayLow"]).or(bar_value(|b| b.low).into()),
        volume: volume(&["volume", "regularMarketVolume"])
            .or(last_bar.map(|bar| Volume(bar.volume)).into()),
        average_volume: volume(&["averageVolume", "averageDailyVolume3Month"]),
        market_cap: number(info, &["marketCap"]).and_then(whole).map(MarketCap).into(),
        pe_ratio: number(info, &["trailingPE"]).map(Ratio).into(),
        dividend_yield: dividend_yield(info).map(Percent).into(),
        fifty_two_week_low: price(&["fiftyTwoWeekLow"]),
        fifty_two_week_high: price(&["fiftyTwoWeekHigh"]),
        sector: text(info, &["sector"]).into(),
        industry: text(info, &["industry"]).into(),
        history,
    }
}

/// First key holding a usable number
fn number(info: &InfoMap, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| info.get(*key).and_then(as_number))
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        // quoteSummary wraps numbers as {"raw": .., "fmt": ..}
        Value::Object(o) => o.get("raw").and_then(as_number),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn whole(n: f64) -> Option<u64> {
    (n >= 0.0).then(|| n.round() as u64)
}

fn text(info: &InfoMap, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        info.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    })
}

/// Dividend yield in percent points
///
/// The quote endpoint reports `dividendYield` already in percent; the
/// summary format (`{"raw": ..}`) and `trailingAnnualDividendYield` are
/// fractions.
fn dividend_yield(info: &InfoMap) -> Option<f64> {
    match info.get("dividendYield") {
        Some(Value::Object(o)) => o.get("raw").and_then(as_number).map(|f| f * 100.0),
        Some(value) => as_number(value),
        None => None,
    }
    .or_else(|| number(info, &["trailingAnnualDividendYield"]).map(|f| f * 100.0))
}

//! Value types shared by the fetchers, the narrative generator and rendering

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Sentinel shown wherever a value could not be obtained
pub const NOT_AVAILABLE: &str = "N/A";

/// A value that may be missing from the provider's response
///
/// Missing values display and serialize as `N/A`, so downstream text never
/// has to special-case them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<T> {
    Value(T),
    NotAvailable,
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::NotAvailable
    }
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::NotAvailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Self::Value(v) => Field::Value(f(v)),
            Self::NotAvailable => Field::NotAvailable,
        }
    }

    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Value(_) => self,
            Self::NotAvailable => other,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NotAvailable, Self::Value)
    }
}

impl<T: fmt::Display> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => v.fmt(f),
            Self::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

/// A price in the quote currency, shown with two decimals
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Price(pub f64);

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A plain ratio such as P/E, shown with two decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ratio(pub f64);

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A percentage expressed in percent points (`0.44` means 0.44%)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Percent(pub f64);

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}

/// Share volume, shown with thousands separators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Volume(pub u64);

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&group_thousands(self.0))
    }
}

/// Market capitalization in whole currency units, e.g. `$3,000,000,000,000`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarketCap(pub u64);

impl fmt::Display for MarketCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", group_thousands(self.0))
    }
}

/// Format an integer with comma thousands separators
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// One bar of the trailing price history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Normalized snapshot of a listed security
///
/// Every field is always present; values the provider did not supply are
/// [`Field::NotAvailable`]. The ticker is upper-cased.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteRecord {
    pub ticker: String,
    pub company_name: Field<String>,
    pub current_price: Field<Price>,
    pub previous_close: Field<Price>,
    pub open: Field<Price>,
    pub day_high: Field<Price>,
    pub day_low: Field<Price>,
    pub volume: Field<Volume>,
    pub average_volume: Field<Volume>,
    pub market_cap: Field<MarketCap>,
    pub pe_ratio: Field<Ratio>,
    pub dividend_yield: Field<Percent>,
    pub fifty_two_week_low: Field<Price>,
    pub fifty_two_week_high: Field<Price>,
    pub sector: Field<String>,
    pub industry: Field<String>,
    /// Trailing window, oldest first
    #[serde(skip)]
    pub history: Vec<PriceBar>,
}

impl QuoteRecord {
    /// A record with only the ticker filled in
    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into().to_uppercase(),
            company_name: Field::NotAvailable,
            current_price: Field::NotAvailable,
            previous_close: Field::NotAvailable,
            open: Field::NotAvailable,
            day_high: Field::NotAvailable,
            day_low: Field::NotAvailable,
            volume: Field::NotAvailable,
            average_volume: Field::NotAvailable,
            market_cap: Field::NotAvailable,
            pe_ratio: Field::NotAvailable,
            dividend_yield: Field::NotAvailable,
            fifty_two_week_low: Field::NotAvailable,
            fifty_two_week_high: Field::NotAvailable,
            sector: Field::NotAvailable,
            industry: Field::NotAvailable,
            history: Vec::new(),
        }
    }

    /// Company name, or the ticker when the name is unknown
    pub fn display_name(&self) -> &str {
        self.company_name
            .value()
            .map_or(self.ticker.as_str(), String::as_str)
    }

    /// `low - high`, or `N/A` when either bound is missing
    pub fn fifty_two_week_range(&self) -> String {
        match (self.fifty_two_week_low.value(), self.fifty_two_week_high.value()) {
            (Some(low), Some(high)) => format!("{low} - {high}"),
            _ => NOT_AVAILABLE.to_string(),
        }
    }

    /// Labelled values in a fixed order, for prompts and reports
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Symbol", self.ticker.clone()),
            ("Company Name", self.company_name.to_string()),
            ("Current Price", self.current_price.to_string()),
            ("Previous Close", self.previous_close.to_string()),
            ("Open", self.open.to_string()),
            ("Day High", self.day_high.to_string()),
            ("Day Low", self.day_low.to_string()),
            ("52-Week Range", self.fifty_two_week_range()),
            ("Volume", self.volume.to_string()),
            ("Average Volume", self.average_volume.to_string()),
            ("Market Cap", self.market_cap.to_string()),
            ("P/E Ratio", self.pe_ratio.to_string()),
            ("Dividend Yield", self.dividend_yield.to_string()),
            ("Sector", self.sector.to_string()),
            ("Industry", self.industry.to_string()),
        ]
    }
}

/// One normalized news or web hit
///
/// All fields are non-empty; anything the provider omitted is `N/A`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub source: String,
    pub link: String,
    pub date: String,
}

impl SearchResult {
    /// Build a result, replacing missing or blank parts with `N/A`
    pub fn new(
        title: Option<String>,
        snippet: Option<String>,
        source: Option<String>,
        link: Option<String>,
        date: Option<String>,
    ) -> Self {
        Self {
            title: or_not_available(title),
            snippet: or_not_available(snippet),
            source: or_not_available(source),
            link: or_not_available(link),
            date: or_not_available(date),
        }
    }

    pub fn has_link(&self) -> bool {
        self.link != NOT_AVAILABLE
    }
}

fn or_not_available(value: Option<String>) -> String {
    value
        .map(|v| v.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Fixed text shown when no narrative could be produced
pub const NARRATIVE_FALLBACK: &str = "AI insights unavailable at this moment.";

/// Outcome of narrative generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum NarrativeResult {
    /// Text produced by the completion provider
    Generated(String),
    /// The provider failed; render [`NARRATIVE_FALLBACK`]
    Unavailable,
}

impl NarrativeResult {
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) => text,
            Self::Unavailable => NARRATIVE_FALLBACK,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }
}

impl fmt::Display for NarrativeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl PartialEq<str> for NarrativeResult {
    fn eq(&self, other: &str) -> bool {
        self.text() == other
    }
}

impl PartialEq<&str> for NarrativeResult {
    fn eq(&self, other: &&str) -> bool {
        self.text() == *other
    }
}

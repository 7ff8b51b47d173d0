//! Stock dashboard core for finsight
//!
//! Three stateless components, each built from a [`FinsightConfig`]:
//!
//! - [`QuoteFetcher`]: ticker to a normalized [`QuoteRecord`] (Yahoo Finance)
//! - [`NewsFetcher`]: free-text query to ordered [`SearchResult`]s (Google
//!   Programmable Search, Serper or Finnhub)
//! - [`NarrativeGenerator`]: quote plus results to analyst prose via an
//!   OpenAI-compatible completion API (Groq by default)
//!
//! [`Dashboard`] runs them in order for one request and collects failures
//! as [`Notice`]s; [`render`] turns the outcome into terminal text.
//!
//! Every component offers a `try_*` operation returning
//! `Result<_, ProviderError>` and a variant that logs the failure and
//! returns a safe default instead (`None`, an empty list, or the fallback
//! narrative).
//!
//! # Example
//!
//! ```rust,ignore
//! use finsight_core::{Dashboard, FinsightConfig, render};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dashboard = Dashboard::from_config(FinsightConfig::from_env()?)?;
//!     let report = dashboard.analyze_ticker("AAPL").await;
//!     println!("{}", render::dashboard(&report));
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod narrative;
pub mod news;
pub mod prompts;
pub mod quote;
pub mod render;

// Re-export main types for convenience
pub use config::{
    CredentialUpdate, Credentials, FinsightConfig, HistoryRange, MarketConfig, NarrativeConfig,
    SearchConfig, SearchProviderKind,
};
pub use dashboard::{Dashboard, DashboardReport, NewsReport, Notice, NoticeLevel};
pub use error::{ConfigError, ProviderError, Result};
pub use model::{
    Field, MarketCap, NARRATIVE_FALLBACK, NOT_AVAILABLE, NarrativeResult, Percent, Price, PriceBar,
    QuoteRecord, Ratio, SearchResult, Volume,
};
pub use narrative::NarrativeGenerator;
pub use news::{DEFAULT_MAX_RESULTS, NewsFetcher, ticker_query};
pub use prompts::NarrativePrompt;
pub use quote::QuoteFetcher;

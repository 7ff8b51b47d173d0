//! Configuration for the quote, news and narrative pipeline
//!
//! A [`FinsightConfig`] is built once at startup and never mutated. Replacing
//! a credential produces a new value via [`FinsightConfig::reconfigure`].

use crate::error::ConfigError;
use finsight_prompt::JinjaTemplate;
use finsight_utils::env;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_SEARCH_API_KEY";
pub const ENV_GOOGLE_ENGINE_ID: &str = "GOOGLE_SEARCH_ENGINE_ID";
pub const ENV_SERPER_API_KEY: &str = "SERPER_API_KEY";
pub const ENV_FINNHUB_API_KEY: &str = "FINNHUB_API_KEY";
pub const ENV_SEARCH_PROVIDER: &str = "FINSIGHT_SEARCH_PROVIDER";
pub const ENV_LLM_MODEL: &str = "FINSIGHT_LLM_MODEL";
pub const ENV_LLM_API_BASE: &str = "FINSIGHT_LLM_API_BASE";
pub const ENV_HISTORY_RANGE: &str = "FINSIGHT_HISTORY_RANGE";
pub const ENV_MAX_RESULTS: &str = "FINSIGHT_MAX_RESULTS";
pub const ENV_TIMEOUT_SECS: &str = "FINSIGHT_TIMEOUT_SECS";

/// Default completion model served by Groq
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Upper bound any search provider accepts for one request
pub const MAX_RESULTS_LIMIT: usize = 10;

/// Trailing window of price history requested with each quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistoryRange {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[default]
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

impl HistoryRange {
    pub const ALL: [Self; 11] = [
        Self::OneDay,
        Self::FiveDays,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
        Self::TwoYears,
        Self::FiveYears,
        Self::TenYears,
        Self::YearToDate,
        Self::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::TenYears => "10y",
            Self::YearToDate => "ytd",
            Self::Max => "max",
        }
    }

    /// Bar interval that keeps the series a readable length
    pub fn interval(&self) -> &'static str {
        match self {
            Self::OneDay => "5m",
            Self::FiveDays => "30m",
            Self::FiveYears | Self::TenYears | Self::Max => "1wk",
            _ => "1d",
        }
    }
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryRange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|range| range.as_str() == wanted)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "Unknown history range '{s}'. Use one of: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max"
                ))
            })
    }
}

/// Which search backend feeds the news list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchProviderKind {
    /// Google Programmable Search (needs key and engine id)
    #[default]
    GoogleCustomSearch,
    /// Serper news endpoint
    SerperNews,
    /// Finnhub company news (ticker queries only)
    FinnhubNews,
}

impl SearchProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoogleCustomSearch => "google",
            Self::SerperNews => "serper",
            Self::FinnhubNews => "finnhub",
        }
    }
}

impl fmt::Display for SearchProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" | "google_cse" | "google-cse" => Ok(Self::GoogleCustomSearch),
            "serper" => Ok(Self::SerperNews),
            "finnhub" => Ok(Self::FinnhubNews),
            other => Err(ConfigError::Invalid(format!(
                "Unknown search provider '{other}'. Use google, serper or finnhub"
            ))),
        }
    }
}

/// Quote fetching options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub history_range: HistoryRange,
}

/// News search options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub provider: SearchProviderKind,

    /// Results requested per search
    pub max_results: usize,

    /// Ask the provider to sort by date where it can
    pub recent_first: bool,

    /// Restrict web results to these domains (Google only)
    pub site_allow_list: Vec<String>,

    /// Google `dateRestrict` value, e.g. `m1` for the last month
    pub date_restrict: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchProviderKind::default(),
            max_results: crate::news::DEFAULT_MAX_RESULTS,
            recent_first: true,
            site_allow_list: vec![
                "finance.yahoo.com".to_string(),
                "seekingalpha.com".to_string(),
                "bloomberg.com".to_string(),
                "reuters.com".to_string(),
            ],
            date_restrict: Some("m1".to_string()),
        }
    }
}

/// Completion options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeConfig {
    pub model: String,

    /// OpenAI-compatible base URL, Groq when unset
    pub api_base: Option<String>,

    pub temperature: f32,

    pub max_tokens: usize,

    /// Replacement for the built-in user prompt template
    pub user_template: Option<String>,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: None,
            temperature: 0.3,
            max_tokens: 1000,
            user_template: None,
        }
    }
}

/// API keys for the outbound services
///
/// `Debug` never prints the secret values.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub completion_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub google_engine_id: Option<String>,
    pub serper_api_key: Option<String>,
    pub finnhub_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(value: Option<&String>) -> &'static str {
            if value.is_some() { "<set>" } else { "<unset>" }
        }

        f.debug_struct("Credentials")
            .field("completion_api_key", &mask(self.completion_api_key.as_ref()))
            .field("google_api_key", &mask(self.google_api_key.as_ref()))
            .field("google_engine_id", &mask(self.google_engine_id.as_ref()))
            .field("serper_api_key", &mask(self.serper_api_key.as_ref()))
            .field("finnhub_api_key", &mask(self.finnhub_api_key.as_ref()))
            .finish()
    }
}

/// Replacement of a single credential at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialUpdate {
    CompletionKey(String),
    GoogleKey(String),
    GoogleEngineId(String),
    SerperKey(String),
    FinnhubKey(String),
}

impl CredentialUpdate {
    /// Environment variable name the credential is normally read from
    pub fn env_name(&self) -> &'static str {
        match self {
            Self::CompletionKey(_) => ENV_GROQ_API_KEY,
            Self::GoogleKey(_) => ENV_GOOGLE_API_KEY,
            Self::GoogleEngineId(_) => ENV_GOOGLE_ENGINE_ID,
            Self::SerperKey(_) => ENV_SERPER_API_KEY,
            Self::FinnhubKey(_) => ENV_FINNHUB_API_KEY,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FinsightConfig {
    pub market: MarketConfig,
    pub search: SearchConfig,
    pub narrative: NarrativeConfig,
    pub credentials: Credentials,

    /// Deadline for each outbound call
    pub request_timeout: Duration,
}

impl Default for FinsightConfig {
    fn default() -> Self {
        Self {
            market: MarketConfig::default(),
            search: SearchConfig::default(),
            narrative: NarrativeConfig::default(),
            credentials: Credentials::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl FinsightConfig {
    /// Create a new configuration builder
    pub fn builder() -> FinsightConfigBuilder {
        FinsightConfigBuilder::default()
    }

    /// Defaults overlaid with the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::builder().with_env()?.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.max_results == 0 || self.search.max_results > MAX_RESULTS_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_results must be between 1 and {MAX_RESULTS_LIMIT}, got {}",
                self.search.max_results
            )));
        }

        if !(0.0..=2.0).contains(&self.narrative.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.narrative.temperature
            )));
        }

        if self.narrative.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.narrative.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if let Some(source) = &self.narrative.user_template {
            JinjaTemplate::new("user_template", source.as_str())?;
        }

        Ok(())
    }

    /// A copy of this configuration with one credential replaced
    pub fn reconfigure(&self, update: CredentialUpdate) -> Self {
        let mut next = self.clone();
        let credentials = &mut next.credentials;
        match update {
            CredentialUpdate::CompletionKey(key) => credentials.completion_api_key = non_blank(key),
            CredentialUpdate::GoogleKey(key) => credentials.google_api_key = non_blank(key),
            CredentialUpdate::GoogleEngineId(id) => credentials.google_engine_id = non_blank(id),
            CredentialUpdate::SerperKey(key) => credentials.serper_api_key = non_blank(key),
            CredentialUpdate::FinnhubKey(key) => credentials.finnhub_api_key = non_blank(key),
        }
        next
    }

    /// A copy of this configuration using another search backend
    pub fn with_search_provider(&self, provider: SearchProviderKind) -> Self {
        let mut next = self.clone();
        next.search.provider = provider;
        next
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Builder for FinsightConfig
#[derive(Debug, Default)]
pub struct FinsightConfigBuilder {
    history_range: Option<HistoryRange>,
    search_provider: Option<SearchProviderKind>,
    max_results: Option<usize>,
    recent_first: Option<bool>,
    site_allow_list: Option<Vec<String>>,
    date_restrict: Option<Option<String>>,
    model: Option<String>,
    api_base: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    user_template: Option<String>,
    credentials: Credentials,
    request_timeout: Option<Duration>,
}

impl FinsightConfigBuilder {
    pub fn history_range(mut self, range: HistoryRange) -> Self {
        self.history_range = Some(range);
        self
    }

    pub fn search_provider(mut self, provider: SearchProviderKind) -> Self {
        self.search_provider = Some(provider);
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn recent_first(mut self, recent_first: bool) -> Self {
        self.recent_first = Some(recent_first);
        self
    }

    /// Restrict web results to these domains; an empty list disables the filter
    pub fn site_allow_list<I, S>(mut self, sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.site_allow_list = Some(sites.into_iter().map(Into::into).collect());
        self
    }

    pub fn date_restrict(mut self, restrict: Option<String>) -> Self {
        self.date_restrict = Some(restrict);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn user_template(mut self, template: impl Into<String>) -> Self {
        self.user_template = Some(template.into());
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Overlay values from the process environment
    ///
    /// Unset variables leave the builder untouched; unparsable ones are errors.
    pub fn with_env(mut self) -> Result<Self, ConfigError> {
        let credentials = &mut self.credentials;
        credentials.completion_api_key = env::var(ENV_GROQ_API_KEY).or(credentials.completion_api_key.take());
        credentials.google_api_key = env::var(ENV_GOOGLE_API_KEY).or(credentials.google_api_key.take());
        credentials.google_engine_id = env::var(ENV_GOOGLE_ENGINE_ID).or(credentials.google_engine_id.take());
        credentials.serper_api_key = env::var(ENV_SERPER_API_KEY).or(credentials.serper_api_key.take());
        credentials.finnhub_api_key = env::var(ENV_FINNHUB_API_KEY).or(credentials.finnhub_api_key.take());

        if let Some(provider) = env::var(ENV_SEARCH_PROVIDER) {
            self.search_provider = Some(provider.parse()?);
        }
        if let Some(range) = env::var(ENV_HISTORY_RANGE) {
            self.history_range = Some(range.parse()?);
        }
        if let Some(model) = env::var(ENV_LLM_MODEL) {
            self.model = Some(model);
        }
        if let Some(api_base) = env::var(ENV_LLM_API_BASE) {
            self.api_base = Some(api_base);
        }
        if let Some(max_results) = env::parse_var::<usize>(ENV_MAX_RESULTS)? {
            self.max_results = Some(max_results);
        }
        if let Some(secs) = env::parse_var::<u64>(ENV_TIMEOUT_SECS)? {
            self.request_timeout = Some(Duration::from_secs(secs));
        }

        Ok(self)
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<FinsightConfig, ConfigError> {
        let defaults = FinsightConfig::default();

        let config = FinsightConfig {
            market: MarketConfig {
                history_range: self.history_range.unwrap_or(defaults.market.history_range),
            },
            search: SearchConfig {
                provider: self.search_provider.unwrap_or(defaults.search.provider),
                max_results: self.max_results.unwrap_or(defaults.search.max_results),
                recent_first: self.recent_first.unwrap_or(defaults.search.recent_first),
                site_allow_list: self.site_allow_list.unwrap_or(defaults.search.site_allow_list),
                date_restrict: self.date_restrict.unwrap_or(defaults.search.date_restrict),
            },
            narrative: NarrativeConfig {
                model: self.model.unwrap_or(defaults.narrative.model),
                api_base: self.api_base.or(defaults.narrative.api_base),
                temperature: self.temperature.unwrap_or(defaults.narrative.temperature),
                max_tokens: self.max_tokens.unwrap_or(defaults.narrative.max_tokens),
                user_template: self.user_template.or(defaults.narrative.user_template),
            },
            credentials: self.credentials,
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FinsightConfig::default();
        assert_eq!(config.market.history_range, HistoryRange::OneMonth);
        assert_eq!(config.search.provider, SearchProviderKind::GoogleCustomSearch);
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.narrative.model, DEFAULT_MODEL);
        assert!((config.narrative.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.narrative.max_tokens, 1000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = FinsightConfig::builder()
            .history_range(HistoryRange::ThreeMonths)
            .search_provider(SearchProviderKind::SerperNews)
            .max_results(3)
            .temperature(0.7)
            .request_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.market.history_range, HistoryRange::ThreeMonths);
        assert_eq!(config.search.provider, SearchProviderKind::SerperNews);
        assert_eq!(config.search.max_results, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validation() {
        assert!(FinsightConfig::builder().max_results(0).build().is_err());
        assert!(FinsightConfig::builder().max_results(11).build().is_err());
        assert!(FinsightConfig::builder().temperature(3.5).build().is_err());
        assert!(FinsightConfig::builder().max_tokens(0).build().is_err());
        assert!(FinsightConfig::builder().model("  ").build().is_err());
        assert!(
            FinsightConfig::builder()
                .request_timeout(Duration::ZERO)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_invalid_user_template_rejected() {
        let result = FinsightConfig::builder()
            .user_template("{% for x in %}")
            .build();
        assert!(matches!(result, Err(ConfigError::Template(_))));
    }

    #[test]
    fn test_history_range_parse() {
        assert_eq!("1mo".parse::<HistoryRange>().unwrap(), HistoryRange::OneMonth);
        assert_eq!(" YTD ".parse::<HistoryRange>().unwrap(), HistoryRange::YearToDate);
        assert!("2w".parse::<HistoryRange>().is_err());

        for range in HistoryRange::ALL {
            assert_eq!(range.as_str().parse::<HistoryRange>().unwrap(), range);
        }
    }

    #[test]
    fn test_search_provider_parse() {
        assert_eq!(
            "Google".parse::<SearchProviderKind>().unwrap(),
            SearchProviderKind::GoogleCustomSearch
        );
        assert_eq!(
            "serper".parse::<SearchProviderKind>().unwrap(),
            SearchProviderKind::SerperNews
        );
        assert_eq!(
            "finnhub".parse::<SearchProviderKind>().unwrap(),
            SearchProviderKind::FinnhubNews
        );
        assert!("duckduckgo".parse::<SearchProviderKind>().is_err());
    }

    #[test]
    fn test_reconfigure_returns_new_value() {
        let original = FinsightConfig::default();
        let updated = original.reconfigure(CredentialUpdate::CompletionKey(" gsk_test ".to_string()));

        assert_eq!(original.credentials.completion_api_key, None);
        assert_eq!(updated.credentials.completion_api_key.as_deref(), Some("gsk_test"));

        let cleared = updated.reconfigure(CredentialUpdate::CompletionKey("   ".to_string()));
        assert_eq!(cleared.credentials.completion_api_key, None);
    }

    #[test]
    fn test_with_search_provider() {
        let config = FinsightConfig::default().with_search_provider(SearchProviderKind::FinnhubNews);
        assert_eq!(config.search.provider, SearchProviderKind::FinnhubNews);
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = Credentials {
            completion_api_key: Some("super-secret".to_string()),
            ..Credentials::default()
        };
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<set>"));
        assert!(debug.contains("<unset>"));
    }

    #[test]
    fn test_credential_env_names() {
        assert_eq!(
            CredentialUpdate::SerperKey(String::new()).env_name(),
            ENV_SERPER_API_KEY
        );
    }

    #[test]
    fn test_with_env() {
        unsafe {
            std::env::set_var(ENV_SERPER_API_KEY, "serper-key");
            std::env::set_var(ENV_HISTORY_RANGE, "6mo");
        }

        let config = FinsightConfig::builder().with_env().unwrap().build().unwrap();
        assert_eq!(config.credentials.serper_api_key.as_deref(), Some("serper-key"));
        assert_eq!(config.market.history_range, HistoryRange::SixMonths);

        unsafe {
            std::env::remove_var(ENV_SERPER_API_KEY);
            std::env::remove_var(ENV_HISTORY_RANGE);
        }
    }
}

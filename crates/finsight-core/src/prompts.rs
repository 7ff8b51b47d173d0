//! Prompt text for the narrative generator
//!
//! The system instruction is fixed text; the user prompt is a MiniJinja
//! template rendered against [`NarrativeContext`]. A custom template sees the
//! same variables:
//!
//! - `ticker`, `company`
//! - `fields`: list of `{label, value}` in a fixed order
//! - `results`: list of `{index, title, snippet, source, link, date}`

use crate::model::{QuoteRecord, SearchResult};
use finsight_prompt::{JinjaTemplate, PromptBuilder, PromptTemplate, Result};
use serde::Serialize;

const USER_TEMPLATE_NAME: &str = "narrative.user";

/// Built-in user prompt
pub const DEFAULT_USER_TEMPLATE: &str = r#"Provide a comprehensive investment analysis of {{ company }} ({{ ticker }}) with a strong emphasis on verifiable facts.

Stock Fundamentals:
{% for field in fields %}
- {{ field.label }}: {{ field.value | na }}
{% endfor %}

Recent Web Search Context:
{% for item in results %}
Source {{ item.index }}: {{ item.title | na }} ({{ item.source | na }})
Snippet: {{ item.snippet | na }}
Link: {{ item.link | na }}
Published: {{ item.date | na }}
{% if not loop.last %}

{% endif %}
{% else %}
No recent news found.
{% endfor %}

Analysis Requirements:
1. Company overview and key financial indicators
2. Recent price performance against the previous close and the 52-week range
{% if results %}
3. Market sentiment as reflected in the news items above
{% else %}
3. Market sentiment as far as the figures above allow
{% endif %}
4. Key risks and opportunities
5. Near-term outlook
{% if results %}

Cite sources by number (for example "Source 1") where they support a statement.
{% endif %}

Format the analysis as a professional report with clear sections. Do not give direct investment advice."#;

/// Fixed system instruction
pub fn system_prompt() -> String {
    PromptBuilder::new()
        .text("You are an objective financial analyst. Provide nuanced, data-driven insights.")
        .blank_line()
        .bullet("Use only the figures and news supplied in the request; treat N/A as unknown.")
        .bullet("Never recommend buying, selling or holding a security.")
        .bullet("Say so plainly when the data is too thin to support a conclusion.")
        .build_trimmed()
}

/// The built-in template, or `custom` when one is configured
pub fn user_template(custom: Option<&str>) -> Result<JinjaTemplate> {
    JinjaTemplate::new(USER_TEMPLATE_NAME, custom.unwrap_or(DEFAULT_USER_TEMPLATE))
}

#[derive(Debug, Serialize)]
struct FieldLine {
    label: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
struct SourceLine<'a> {
    index: usize,
    title: &'a str,
    snippet: &'a str,
    source: &'a str,
    link: &'a str,
    date: &'a str,
}

/// Template variables for one narrative request
#[derive(Debug, Serialize)]
pub struct NarrativeContext<'a> {
    ticker: &'a str,
    company: &'a str,
    fields: Vec<FieldLine>,
    results: Vec<SourceLine<'a>>,
}

impl<'a> NarrativeContext<'a> {
    pub fn new(quote: &'a QuoteRecord, results: &'a [SearchResult]) -> Self {
        let fields = quote
            .fields()
            .into_iter()
            .filter(|(label, _)| *label != "Symbol")
            .map(|(label, value)| FieldLine { label, value })
            .collect();

        let results = results
            .iter()
            .enumerate()
            .map(|(i, r)| SourceLine {
                index: i + 1,
                title: &r.title,
                snippet: &r.snippet,
                source: &r.source,
                link: &r.link,
                date: &r.date,
            })
            .collect();

        Self {
            ticker: &quote.ticker,
            company: quote.display_name(),
            fields,
            results,
        }
    }
}

/// System and user text for one completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativePrompt {
    pub system: String,
    pub user: String,
}

impl NarrativePrompt {
    pub fn render(template: &JinjaTemplate, quote: &QuoteRecord, results: &[SearchResult]) -> Result<Self> {
        let user = template.render_serialize(&NarrativeContext::new(quote, results))?;
        Ok(Self {
            system: system_prompt(),
            user: user.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, MarketCap, Price};

    fn quote() -> QuoteRecord {
        let mut quote = QuoteRecord::empty("AAPL");
        quote.company_name = Field::Value("Apple Inc.".to_string());
        quote.current_price = Field::Value(Price(190.12));
        quote.market_cap = Field::Value(MarketCap(3_000_000_000_000));
        quote
    }

    fn result(title: &str) -> SearchResult {
        SearchResult::new(
            Some(title.to_string()),
            Some("Snippet text".to_string()),
            Some("Reuters".to_string()),
            Some("https://example.com".to_string()),
            Some("2024-05-02".to_string()),
        )
    }

    fn render(quote: &QuoteRecord, results: &[SearchResult]) -> NarrativePrompt {
        NarrativePrompt::render(&user_template(None).unwrap(), quote, results).unwrap()
    }

    #[test]
    fn test_prompt_with_results() {
        let results = [result("Apple beats estimates"), result("iPhone sales slow in China")];
        let prompt = render(&quote(), &results);

        assert!(prompt.user.starts_with("Provide a comprehensive investment analysis of Apple Inc. (AAPL)"));
        assert!(prompt.user.contains("- Current Price: 190.12\n"));
        assert!(prompt.user.contains("- Market Cap: $3,000,000,000,000\n"));
        assert!(prompt.user.contains("Source 1: Apple beats estimates (Reuters)\n"));
        assert!(prompt.user.contains("Source 2: iPhone sales slow in China (Reuters)\n"));
        assert!(prompt.user.contains("Cite sources by number"));
        assert!(!prompt.user.contains("No recent news found."));
        assert!(prompt.user.contains("Do not give direct investment advice."));
    }

    #[test]
    fn test_prompt_without_results_mentions_no_source() {
        let prompt = render(&quote(), &[]);

        assert!(prompt.user.contains("No recent news found."));
        assert!(!prompt.user.to_lowercase().contains("source"));
        assert!(!prompt.system.to_lowercase().contains("source"));
    }

    #[test]
    fn test_prompt_with_sentinel_fields() {
        let prompt = render(&QuoteRecord::empty("zzzz"), &[]);

        assert!(prompt.user.contains("analysis of ZZZZ (ZZZZ)"));
        assert!(prompt.user.contains("- P/E Ratio: N/A\n"));
        assert!(prompt.user.contains("- 52-Week Range: N/A\n"));
    }

    #[test]
    fn test_requirements_listed() {
        let prompt = render(&quote(), &[]);
        for requirement in ["overview", "price performance", "sentiment", "risks and opportunities", "outlook"] {
            assert!(prompt.user.contains(requirement), "missing {requirement}");
        }
    }

    #[test]
    fn test_system_prompt() {
        let system = system_prompt();
        assert!(system.starts_with("You are an objective financial analyst."));
        assert!(system.contains("- Never recommend buying, selling or holding a security."));
    }

    #[test]
    fn test_custom_template() {
        let template = user_template(Some("{{ ticker }} has {{ results | length }} items; P/E {{ fields[10].value }}")).unwrap();
        let prompt = NarrativePrompt::render(&template, &quote(), &[result("a")]).unwrap();
        assert_eq!(prompt.user, "AAPL has 1 items; P/E N/A");
    }

    #[test]
    fn test_render_is_deterministic() {
        let results = [result("one"), result("two")];
        assert_eq!(render(&quote(), &results), render(&quote(), &results));
    }
}

//! Plain-text rendering of reports for a terminal

use crate::dashboard::{DashboardReport, NewsReport, Notice, NoticeLevel};
use crate::model::{Field, NOT_AVAILABLE, NarrativeResult, PriceBar, QuoteRecord, SearchResult};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, ContentArrangement, Table};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Default sparkline width in characters
pub const CHART_WIDTH: usize = 60;

/// Headline tiles: current price, market cap and P/E
pub fn metric_tiles(quote: &QuoteRecord) -> String {
    let price = match &quote.current_price {
        Field::Value(price) => format!("${price}"),
        Field::NotAvailable => NOT_AVAILABLE.to_string(),
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Current Price", "Market Cap", "P/E Ratio"])
        .add_row(vec![price, quote.market_cap.to_string(), quote.pe_ratio.to_string()]);

    for column in table.column_iter_mut() {
        column.set_cell_alignment(CellAlignment::Center);
    }
    table.to_string()
}

/// Every quote field as `**Label**: value` lines
pub fn stock_report(quote: Option<&QuoteRecord>) -> String {
    let Some(quote) = quote else {
        return "No stock information available.".to_string();
    };

    let mut out = String::from("🔍 **Stock Analysis Report**\n\n");
    for (label, value) in quote.fields() {
        out.push_str(&format!("**{label}**: {value}\n"));
    }
    out
}

/// Numbered result list with snippets
pub fn results_list(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No search results found.".to_string();
    }

    let mut out = String::from("📰 **Market News and Trends**\n\n");
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!("{}. **{}**\n", i + 1, result.title));
        out.push_str(&format!("   {} | {}\n", result.source, result.date));
        out.push_str(&format!("   {}\n", result.snippet));
        if result.has_link() {
            out.push_str(&format!("   🔗 {}\n", result.link));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// Compact citation list, `None` when there is nothing to cite
pub fn sources_consulted(results: &[SearchResult]) -> Option<String> {
    if results.is_empty() {
        return None;
    }

    let mut out = String::from("📚 **Sources Consulted**\n\n");
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!("{}. {} ({})\n", i + 1, result.title, result.link));
    }
    Some(out.trim_end().to_string())
}

pub fn narrative(narrative: &NarrativeResult) -> String {
    format!("🤖 **AI-Powered Insights**\n\n{}", narrative.text())
}

/// Sparkline of closing prices plus a range summary line
///
/// The series is bucketed down to `width` points. Returns `None` for an
/// empty history.
pub fn price_chart(history: &[PriceBar], width: usize) -> Option<String> {
    let first = history.first()?;
    let last = history.last()?;
    let closes: Vec<f64> = history.iter().map(|bar| bar.close).collect();

    let points = downsample(&closes, width.max(1));
    let low = points.iter().copied().fold(f64::INFINITY, f64::min);
    let high = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = high - low;

    let line: String = points
        .iter()
        .map(|value| {
            if span <= f64::EPSILON {
                SPARK_LEVELS[SPARK_LEVELS.len() / 2]
            } else {
                let level = ((value - low) / span * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
                SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
            }
        })
        .collect();

    let change = if first.close.abs() > f64::EPSILON {
        format!("{:+.2}%", (last.close - first.close) / first.close * 100.0)
    } else {
        NOT_AVAILABLE.to_string()
    };

    Some(format!(
        "📈 {} → {}\n{line}\nLow ${low:.2} · High ${high:.2} · Change {change}",
        first.timestamp.format("%Y-%m-%d"),
        last.timestamp.format("%Y-%m-%d"),
    ))
}

/// Average consecutive values into at most `width` buckets
fn downsample(values: &[f64], width: usize) -> Vec<f64> {
    if values.len() <= width {
        return values.to_vec();
    }
    (0..width)
        .map(|i| {
            let start = i * values.len() / width;
            let end = ((i + 1) * values.len() / width).max(start + 1);
            let bucket = &values[start..end];
            bucket.iter().sum::<f64>() / bucket.len() as f64
        })
        .collect()
}

pub fn notice(notice: &Notice) -> String {
    let icon = match notice.level {
        NoticeLevel::Info => "ℹ️",
        NoticeLevel::Warning => "⚠️",
        NoticeLevel::Error => "❌",
    };
    format!("{icon} {}", notice.message)
}

/// The whole ticker view: notices, tiles, chart, report, news, narrative
pub fn dashboard(report: &DashboardReport) -> String {
    let mut sections = Vec::new();

    sections.extend(report.notices.iter().map(notice));

    if let Some(quote) = &report.quote {
        sections.push(format!("💹 {} ({})", quote.display_name(), quote.ticker));
        sections.push(metric_tiles(quote));
        if let Some(chart) = price_chart(&quote.history, CHART_WIDTH) {
            sections.push(chart);
        }
    }
    sections.push(stock_report(report.quote.as_ref()));
    sections.push(results_list(&report.results));

    if let Some(text) = &report.narrative {
        sections.push(narrative(text));
        if text.is_generated() {
            sections.extend(sources_consulted(&report.results));
        }
    }

    sections.join("\n\n")
}

pub fn news(report: &NewsReport) -> String {
    let mut sections: Vec<String> = report.notices.iter().map(notice).collect();
    if !report.results.is_empty() || report.notices.is_empty() {
        sections.push(results_list(&report.results));
    }
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MarketCap, Price, Ratio};
    use chrono::{TimeZone, Utc};

    fn quote() -> QuoteRecord {
        let mut quote = QuoteRecord::empty("AAPL");
        quote.company_name = Field::Value("Apple Inc.".to_string());
        quote.current_price = Field::Value(Price(190.12));
        quote.market_cap = Field::Value(MarketCap(3_000_000_000_000));
        quote.pe_ratio = Field::Value(Ratio(29.6));
        quote
    }

    fn result(title: &str, link: Option<&str>) -> SearchResult {
        SearchResult::new(
            Some(title.to_string()),
            Some("Snippet".to_string()),
            Some("Reuters".to_string()),
            link.map(ToString::to_string),
            None,
        )
    }

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1 + i as u32, 20, 0, 0).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0,
            })
            .collect()
    }

    #[test]
    fn test_metric_tiles() {
        let tiles = metric_tiles(&quote());
        assert!(tiles.contains("Current Price"));
        assert!(tiles.contains("$190.12"));
        assert!(tiles.contains("$3,000,000,000,000"));
        assert!(tiles.contains("29.60"));

        let empty = metric_tiles(&QuoteRecord::empty("X"));
        assert_eq!(empty.matches("N/A").count(), 3);
    }

    #[test]
    fn test_stock_report() {
        let report = stock_report(Some(&quote()));
        assert!(report.starts_with("🔍 **Stock Analysis Report**"));
        assert!(report.contains("**Company Name**: Apple Inc.\n"));
        assert!(report.contains("**Dividend Yield**: N/A\n"));

        assert_eq!(stock_report(None), "No stock information available.");
    }

    #[test]
    fn test_results_list() {
        assert_eq!(results_list(&[]), "No search results found.");

        let list = results_list(&[
            result("First", Some("https://example.com/1")),
            result("Second", None),
        ]);
        assert!(list.starts_with("📰 **Market News and Trends**"));
        assert!(list.contains("1. **First**"));
        assert!(list.contains("🔗 https://example.com/1"));
        assert!(list.contains("2. **Second**"));
        assert_eq!(list.matches("🔗").count(), 1);
    }

    #[test]
    fn test_sources_consulted() {
        assert_eq!(sources_consulted(&[]), None);
        let sources = sources_consulted(&[result("First", Some("https://example.com/1"))]).unwrap();
        assert!(sources.ends_with("1. First (https://example.com/1)"));
    }

    #[test]
    fn test_price_chart() {
        let chart = price_chart(&bars(&[10.0, 12.0, 11.0, 15.0]), 60).unwrap();
        let lines: Vec<_> = chart.lines().collect();

        assert_eq!(lines[0], "📈 2024-05-01 → 2024-05-04");
        assert_eq!(lines[1], "▁▄▂█");
        assert_eq!(lines[2], "Low $10.00 · High $15.00 · Change +50.00%");
    }

    #[test]
    fn test_price_chart_flat_and_empty() {
        assert_eq!(price_chart(&[], 60), None);

        let chart = price_chart(&bars(&[5.0, 5.0]), 60).unwrap();
        assert!(chart.contains("▅▅"));
        assert!(chart.ends_with("Change +0.00%"));
    }

    #[test]
    fn test_downsample() {
        let values: Vec<f64> = (0..10).map(f64::from).collect();
        assert_eq!(downsample(&values, 5), vec![0.5, 2.5, 4.5, 6.5, 8.5]);
        assert_eq!(downsample(&values, 20).len(), 10);
    }

    #[test]
    fn test_notice() {
        assert_eq!(notice(&Notice::error("boom")), "❌ boom");
        assert_eq!(notice(&Notice::info("fyi")), "ℹ️ fyi");
    }

    #[test]
    fn test_dashboard_layout() {
        let mut q = quote();
        q.history = bars(&[1.0, 2.0]);
        let report = DashboardReport {
            ticker: "AAPL".to_string(),
            quote: Some(q),
            results: vec![result("Headline", Some("https://example.com/h"))],
            narrative: Some(NarrativeResult::Generated("Solid quarter.".to_string())),
            notices: Vec::new(),
        };

        let text = dashboard(&report);
        let order = [
            "💹 Apple Inc. (AAPL)",
            "Current Price",
            "📈",
            "Stock Analysis Report",
            "Market News and Trends",
            "Solid quarter.",
            "Sources Consulted",
        ];
        let positions: Vec<_> = order.iter().map(|s| text.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_dashboard_without_quote() {
        let report = DashboardReport {
            ticker: "ZZZZ".to_string(),
            quote: None,
            results: Vec::new(),
            narrative: None,
            notices: vec![Notice::error("Unable to retrieve stock information for ZZZZ")],
        };

        let text = dashboard(&report);
        assert!(text.starts_with("❌ Unable to retrieve"));
        assert!(text.contains("No stock information available."));
        assert!(text.contains("No search results found."));
        assert!(!text.contains("AI-Powered Insights"));
    }

    #[test]
    fn test_fallback_narrative_has_no_sources() {
        let report = DashboardReport {
            ticker: "AAPL".to_string(),
            quote: Some(quote()),
            results: vec![result("Headline", None)],
            narrative: Some(NarrativeResult::Unavailable),
            notices: Vec::new(),
        };

        let text = dashboard(&report);
        assert!(text.contains(crate::model::NARRATIVE_FALLBACK));
        assert!(!text.contains("Sources Consulted"));
    }
}

//! MiniJinja-based template implementation

use crate::{PromptError, PromptTemplate, Result};
use minijinja::{Environment, Value};

/// Placeholder rendered by the `na` filter
pub const NOT_AVAILABLE: &str = "N/A";

/// A prompt template backed by MiniJinja
///
/// The template uses standard Jinja2 syntax:
/// - Variables: `{{ variable }}`
/// - Filters: `{{ name | upper }}`, `{{ field | na }}`
/// - Conditionals: `{% if condition %}...{% endif %}`
/// - Loops: `{% for item in items %}...{% endfor %}`
///
/// Block tags strip their own line (`trim_blocks` and `lstrip_blocks`), so
/// templates can be indented for readability without leaking whitespace.
///
/// The `na` filter renders undefined, `none` and blank values as `N/A`, which
/// lets a template reference optional data without guarding every access.
pub struct JinjaTemplate {
    name: String,
    source: String,
}

impl JinjaTemplate {
    /// Create a template, failing if the source does not parse
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        let env = environment();
        env.template_from_str(&source)
            .map_err(|e| PromptError::TemplateParseFailed {
                name: name.clone(),
                detail: e.to_string(),
            })?;

        Ok(Self { name, source })
    }
}

/// Build the rendering environment with our filters
fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);

    env.add_filter("upper", |s: String| s.to_uppercase());
    env.add_filter("trim", |s: String| s.trim().to_string());
    env.add_filter("na", not_available);
    env
}

fn not_available(value: Value) -> String {
    if value.is_undefined() || value.is_none() {
        return NOT_AVAILABLE.to_string();
    }

    let text = value.to_string();
    if text.trim().is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        text
    }
}

impl PromptTemplate for JinjaTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, vars: &serde_json::Value) -> Result<String> {
        let env = environment();
        let value = Value::from_serialize(vars);

        env.render_str(&self.source, value)
            .map_err(|e| PromptError::RenderError {
                name: self.name.clone(),
                detail: e.to_string(),
            })
    }

    fn raw_template(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Debug for JinjaTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JinjaTemplate")
            .field("name", &self.name)
            .field("len", &self.source.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variable_interpolation() {
        let template = JinjaTemplate::new("t", "Price of {{ symbol }}: {{ price }}").unwrap();
        let result = template
            .render(&json!({ "symbol": "MSFT", "price": 410.5 }))
            .unwrap();
        assert_eq!(result, "Price of MSFT: 410.5");
    }

    #[test]
    fn test_parse_error_at_construction() {
        let result = JinjaTemplate::new("broken", "{% if x %}never closed");
        assert!(matches!(result, Err(PromptError::TemplateParseFailed { .. })));
    }

    #[test]
    fn test_na_filter() {
        let template =
            JinjaTemplate::new("t", "{{ missing | na }}|{{ blank | na }}|{{ nothing | na }}|{{ value | na }}")
                .unwrap();
        let result = template
            .render(&json!({ "blank": "  ", "nothing": null, "value": 3 }))
            .unwrap();
        assert_eq!(result, "N/A|N/A|N/A|3");
    }

    #[test]
    fn test_loop_with_trimmed_blocks() {
        let template = JinjaTemplate::new(
            "list",
            "{% for item in items %}\n  {{ loop.index }}. {{ item }}\n{% endfor %}",
        )
        .unwrap();
        let result = template.render(&json!({ "items": ["a", "b"] })).unwrap();
        assert_eq!(result, "  1. a\n  2. b\n");
    }

    #[test]
    fn test_upper_filter() {
        let template = JinjaTemplate::new("t", "{{ s | upper }}").unwrap();
        assert_eq!(template.render(&json!({ "s": "aapl" })).unwrap(), "AAPL");
    }
}

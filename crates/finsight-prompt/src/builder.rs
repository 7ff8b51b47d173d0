//! Fluent prompt builder
//!
//! [`PromptBuilder`] assembles fixed text piece by piece. It is used for the
//! system instruction and for markdown reports, where a template would only
//! add indirection.

/// A fluent builder for markdown-flavoured text
///
/// # Examples
///
/// ```
/// use finsight_prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new()
///     .text("You are an objective financial analyst.")
///     .newline()
///     .section("Rules")
///     .bullet("Stay factual")
///     .when(true, "Never give direct investment advice.")
///     .build();
///
/// assert!(prompt.contains("- Stay factual"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    parts: Vec<String>,
}

impl PromptBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add static text
    ///
    /// ```
    /// use finsight_prompt::PromptBuilder;
    ///
    /// let prompt = PromptBuilder::new().text("Hello, ").text("World!").build();
    /// assert_eq!(prompt, "Hello, World!");
    /// ```
    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.parts.push(content.into());
        self
    }

    /// Add a newline
    pub fn newline(self) -> Self {
        self.text("\n")
    }

    /// Add a blank line (two newlines)
    pub fn blank_line(self) -> Self {
        self.text("\n\n")
    }

    /// Add a section header (markdown h2)
    pub fn section(self, title: impl Into<String>) -> Self {
        self.text(format!("\n## {}\n", title.into()))
    }

    /// Add content only when `condition` holds
    pub fn when(self, condition: bool, content: impl Into<String>) -> Self {
        if condition { self.text(content) } else { self }
    }

    /// Add a bullet point
    pub fn bullet(self, content: impl Into<String>) -> Self {
        self.text(format!("- {}\n", content.into()))
    }

    /// Add items as a numbered list starting at 1
    pub fn numbered_list<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (idx, item) in items.into_iter().enumerate() {
            self = self.text(format!("{}. {}\n", idx + 1, item.into()));
        }
        self
    }

    /// Add a bold key/value line (`**key**: value`)
    pub fn field(self, key: impl Into<String>, value: impl std::fmt::Display) -> Self {
        self.text(format!("**{}**: {}\n", key.into(), value))
    }

    /// Whether nothing has been added
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Concatenate all parts
    pub fn build(self) -> String {
        self.parts.concat()
    }

    /// Concatenate all parts and trim surrounding whitespace
    pub fn build_trimmed(self) -> String {
        self.build().trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_and_bullets() {
        let prompt = PromptBuilder::new()
            .text("Intro")
            .section("Requirements")
            .bullet("one")
            .bullet("two")
            .build();

        assert_eq!(prompt, "Intro\n## Requirements\n- one\n- two\n");
    }

    #[test]
    fn test_conditional() {
        let with = PromptBuilder::new().text("Base").when(true, " extra").build();
        let without = PromptBuilder::new().text("Base").when(false, " extra").build();
        assert_eq!(with, "Base extra");
        assert_eq!(without, "Base");
    }

    #[test]
    fn test_numbered_list() {
        let prompt = PromptBuilder::new()
            .numbered_list(["Overview", "Outlook"])
            .build();
        assert_eq!(prompt, "1. Overview\n2. Outlook\n");
    }

    #[test]
    fn test_field() {
        let prompt = PromptBuilder::new().field("Sector", "Technology").build();
        assert_eq!(prompt, "**Sector**: Technology\n");
    }

    #[test]
    fn test_build_trimmed_and_empty() {
        assert!(PromptBuilder::new().is_empty());
        let prompt = PromptBuilder::new().blank_line().text("x").blank_line().build_trimmed();
        assert_eq!(prompt, "x");
    }
}

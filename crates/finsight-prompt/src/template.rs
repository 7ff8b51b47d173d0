//! Core prompt template trait

use crate::{PromptError, Result};
use serde::Serialize;

/// A named template that turns variables into prompt text
///
/// Variables are passed as `serde_json::Value` so the trait stays
/// dyn-compatible; [`PromptTemplate::render_serialize`] converts any
/// `Serialize` value first.
pub trait PromptTemplate: Send + Sync {
    /// Template name/identifier
    fn name(&self) -> &str;

    /// Render the template with variables
    fn render(&self, vars: &serde_json::Value) -> Result<String>;

    /// Raw template source (for debugging/inspection)
    fn raw_template(&self) -> &str;

    /// Render from any serializable context
    fn render_serialize<T: Serialize>(&self, vars: &T) -> Result<String>
    where
        Self: Sized,
    {
        let value = serde_json::to_value(vars)
            .map_err(|e| PromptError::SerializationError(e.to_string()))?;
        self.render(&value)
    }
}

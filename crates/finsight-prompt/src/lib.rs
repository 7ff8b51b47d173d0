//! Prompt templates for finsight
//!
//! Two ways of producing prompt text:
//!
//! - [`JinjaTemplate`]: a named MiniJinja template rendered against any
//!   `Serialize` value. Templates are checked for syntax errors when they are
//!   created, so a template that constructs always renders.
//! - [`PromptBuilder`]: a fluent builder for fixed markdown-ish text.
//!
//! # Quick Start
//!
//! ```
//! use finsight_prompt::{JinjaTemplate, PromptTemplate};
//! use serde_json::json;
//!
//! let template = JinjaTemplate::new("greeting", "Analyze {{ symbol | upper }}").unwrap();
//! let text = template.render(&json!({ "symbol": "aapl" })).unwrap();
//! assert_eq!(text, "Analyze AAPL");
//! ```
//!
//! ```
//! use finsight_prompt::PromptBuilder;
//!
//! let prompt = PromptBuilder::new()
//!     .text("You are an objective financial analyst.")
//!     .section("Requirements")
//!     .bullet("Stay factual")
//!     .build();
//!
//! assert!(prompt.contains("## Requirements"));
//! ```

mod builder;
mod error;
mod jinja;
mod template;

pub use builder::PromptBuilder;
pub use error::{PromptError, Result};
pub use jinja::JinjaTemplate;
pub use template::PromptTemplate;

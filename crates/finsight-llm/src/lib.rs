//! Completion provider abstraction for finsight
//!
//! This crate provides provider-agnostic types for asking a hosted language
//! model for a single completion:
//!
//! - Message types ([`Message`], [`Role`])
//! - Completion request/response types
//! - The [`LLMProvider`] trait
//! - An OpenAI-compatible HTTP provider (behind the `openai` feature), which
//!   also serves Groq and local OpenAI-style servers

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

// Provider implementations (feature-gated)
#[cfg(feature = "openai")]
pub mod providers;

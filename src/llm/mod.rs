//! LLM Layer - text generation over hosted models
//!
//! This module provides:
//! - TextGenerator trait, the seam every pattern is written against
//! - AnthropicGenerator implementation
//! - ScriptedGenerator for deterministic runs
//! - Wire types mapping the domain history onto chat messages

pub mod anthropic;
pub mod client;
pub mod types;

pub use anthropic::{AnthropicConfig, AnthropicGenerator};
pub use client::{LlmError, ScriptedGenerator, TextGenerator};
pub use types::{ApiMessage, ApiRole, StopReason, Usage, to_api_messages};

//! Reflector - prompt-orchestration patterns over hosted LLMs
//!
//! The core is a bounded reflection loop: a generator drafts an artifact, a
//! critic reviews it, and the draft is refined until the critic is satisfied
//! or the iteration budget is spent. Prompt chaining, routing and parallel
//! fan-out are provided alongside it, all written against one
//! `TextGenerator` trait.

pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod patterns;
pub mod prompt;
pub mod runner;

pub use error::{ReflectorError, Result};

//! Composition patterns over [`TextGenerator`](crate::llm::TextGenerator)
//!
//! - chain: sequential templated steps, each feeding the next
//! - route: classifier-driven dispatch to labelled handlers
//! - fan_out: independent prompts run concurrently
//! - json: pull a JSON object out of a model reply

pub mod chain;
pub mod fan_out;
pub mod json;
pub mod route;

pub use chain::{ChainOutput, ChainStep, PromptChain};
pub use fan_out::{FanOutResult, FanOutTask, fan_out, topic_tasks};
pub use json::extract_json;
pub use route::{RouteDecision, Router};

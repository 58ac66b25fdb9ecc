//! Wire-level types for chat-completion APIs
//!
//! The domain history has three roles; chat APIs have two. This module maps
//! one onto the other.

use serde::{Deserialize, Serialize};

use crate::domain::{ConversationHistory, Role};

/// Role in a chat-completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiRole {
    User,
    Assistant,
}

impl From<Role> for ApiRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Task | Role::Critique => ApiRole::User,
            Role::Generation => ApiRole::Assistant,
        }
    }
}

/// A message in a chat-completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: ApiRole,
    pub content: String,
}

impl ApiMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ApiRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ApiRole::Assistant,
            content: content.into(),
        }
    }
}

/// Convert a history into alternating API messages.
///
/// Consecutive messages that map to the same API role are joined with a
/// blank line, since chat APIs reject two user turns in a row.
pub fn to_api_messages(history: &ConversationHistory) -> Vec<ApiMessage> {
    let mut out: Vec<ApiMessage> = Vec::with_capacity(history.len());
    for message in history.messages() {
        let role = ApiRole::from(message.role);
        match out.last_mut() {
            Some(prev) if prev.role == role => {
                prev.content.push_str("\n\n");
                prev.content.push_str(&message.content);
            }
            _ => out.push(ApiMessage {
                role,
                content: message.content.clone(),
            }),
        }
    }
    out
}

/// Reason why the LLM stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    #[default]
    EndTurn,
    MaxTokens,
    StopSequence,
}

impl StopReason {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("max_tokens") => StopReason::MaxTokens,
            Some("stop_sequence") => StopReason::StopSequence,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    /// Accumulate usage from another instance
    pub fn add(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    /// Estimated cost in USD, priced per million tokens by model family
    pub fn cost_usd(&self, model: &str) -> f64 {
        let (input_per_mtok, output_per_mtok) = price_per_mtok(model);
        (self.input_tokens as f64 * input_per_mtok + self.output_tokens as f64 * output_per_mtok) / 1_000_000.0
    }
}

fn price_per_mtok(model: &str) -> (f64, f64) {
    if model.contains("opus") {
        (15.0, 75.0)
    } else if model.contains("haiku") {
        (0.25, 1.25)
    } else {
        // sonnet and unknown models
        (3.0, 15.0)
    }
}

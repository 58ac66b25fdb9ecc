//! Core text generation trait and error types

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ConversationHistory;

/// A black-box text transformation, typically a hosted LLM call.
///
/// Implementations get the whole history and return one reply. They own
/// their retry and timeout policy; callers treat an `Err` as fatal.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a reply for the given history
    async fn generate(&self, history: &ConversationHistory) -> Result<String, LlmError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },

    #[error("Scripted generator has no replies left")]
    Exhausted,
}

impl LlmError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::Network(_) => true,
            LlmError::InvalidResponse(_) => false,
            LlmError::MissingApiKey { .. } => false,
            LlmError::Exhausted => false,
        }
    }
}

/// Deterministic generator that replays queued replies in order.
///
/// Every history it is called with is kept so tests can assert on what the
/// caller sent.
pub struct ScriptedGenerator {
    name: String,
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<ConversationHistory>>,
}

impl ScriptedGenerator {
    /// Create a generator that returns each reply once, in order
    pub fn new(name: impl Into<String>, replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a generator that returns the same reply `count` times
    pub fn repeating(name: impl Into<String>, reply: impl Into<String>, count: usize) -> Self {
        let reply = reply.into();
        Self::new(name, std::iter::repeat_n(reply, count))
    }

    /// Queue a failure after the replies already scripted
    pub fn then_fail(self, error: LlmError) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Err(error));
        }
        self
    }

    /// Histories received so far, oldest first
    pub fn calls(&self) -> Vec<ConversationHistory> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.replies.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, history: &ConversationHistory) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(history.clone());
        }
        let next = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        next.unwrap_or(Err(LlmError::Exhausted))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for ScriptedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedGenerator")
            .field("name", &self.name)
            .field("remaining", &self.remaining())
            .finish()
    }
}

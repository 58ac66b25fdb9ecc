//! Anthropic API generator
//!
//! Implements [`TextGenerator`] over the Anthropic Messages API. Each
//! instance carries one fixed system prompt, so a generator and a critic can
//! share a model while playing different parts.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::domain::ConversationHistory;
use crate::llm::client::{LlmError, TextGenerator};
use crate::llm::types::{StopReason, Usage, to_api_messages};

/// Anthropic API base URL
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Configuration for the Anthropic generator
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.0,
            timeout: Duration::from_secs(300),
        }
    }
}

impl AnthropicConfig {
    /// Create a new config with a specific model
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Text generator backed by the Anthropic Messages API
pub struct AnthropicGenerator {
    name: String,
    client: Client,
    api_key: String,
    system: String,
    config: AnthropicConfig,
    usage: Arc<Mutex<Usage>>,
}

impl AnthropicGenerator {
    /// Create a generator, reading the key from `ANTHROPIC_API_KEY`
    pub fn new(name: impl Into<String>, system: impl Into<String>, config: AnthropicConfig) -> Result<Self, LlmError> {
        Self::from_env(name, API_KEY_ENV, system, config)
    }

    /// Create a generator, reading the key from `env_var`
    pub fn from_env(
        name: impl Into<String>,
        env_var: &str,
        system: impl Into<String>,
        config: AnthropicConfig,
    ) -> Result<Self, LlmError> {
        let api_key = std::env::var(env_var).map_err(|_| LlmError::MissingApiKey {
            env_var: env_var.to_string(),
        })?;

        Self::with_api_key(name, api_key, system, config)
    }

    /// Create a generator with an explicit API key
    pub fn with_api_key(
        name: impl Into<String>,
        api_key: impl Into<String>,
        system: impl Into<String>,
        config: AnthropicConfig,
    ) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            name: name.into(),
            client,
            api_key: api_key.into(),
            system: system.into(),
            config,
            usage: Arc::new(Mutex::new(Usage::default())),
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the request body for the Messages API
    fn build_request(&self, history: &ConversationHistory) -> Value {
        let messages = to_api_messages(history);

        let mut body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": messages,
        });

        if !self.system.is_empty() {
            body["system"] = json!(self.system);
        }

        body
    }

    /// Pull the text out of a Messages API response
    fn parse_response(&self, body: Value) -> Result<String, LlmError> {
        let stop_reason = StopReason::parse(body["stop_reason"].as_str());
        if stop_reason == StopReason::MaxTokens {
            log::warn!("{}: reply truncated at max_tokens={}", self.name, self.config.max_tokens);
        }

        if let Some(u) = body.get("usage") {
            let usage = Usage::new(
                u["input_tokens"].as_u64().unwrap_or(0),
                u["output_tokens"].as_u64().unwrap_or(0),
            );
            if let Ok(mut total) = self.usage.lock() {
                total.add(&usage);
            }
        }

        let blocks = body["content"]
            .as_array()
            .ok_or_else(|| LlmError::InvalidResponse("missing content array".to_string()))?;

        let text = blocks
            .iter()
            .filter(|block| block["type"].as_str() == Some("text"))
            .filter_map(|block| block["text"].as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(text)
    }

    async fn send_request(&self, body: Value) -> Result<Value, LlmError> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            // Non-2xx always maps to Some; the fallback only satisfies the borrow checker.
            return Err(error_for_status(status.as_u16(), retry_after.as_deref(), body)
                .unwrap_or_else(|| LlmError::InvalidResponse(format!("unexpected status {status}"))));
        }

        Ok(response.json().await?)
    }

    /// Get cumulative token usage
    pub fn total_usage(&self) -> Usage {
        self.usage.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

/// Map a non-success HTTP status to an error.
///
/// 429 becomes `RateLimited`, honouring a numeric `retry-after` header and
/// defaulting to 60s. Any other non-2xx status becomes `Api`.
fn error_for_status(status: u16, retry_after: Option<&str>, body: String) -> Option<LlmError> {
    match status {
        200..=299 => None,
        429 => {
            let secs = retry_after
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            Some(LlmError::RateLimited {
                retry_after: Duration::from_secs(secs),
            })
        }
        _ => Some(LlmError::Api { status, message: body }),
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    async fn generate(&self, history: &ConversationHistory) -> Result<String, LlmError> {
        log::debug!("{}: sending {} messages to {}", self.name, history.len(), self.config.model);
        let body = self.build_request(history);
        let response = self.send_request(body).await?;
        self.parse_response(response)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for AnthropicGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicGenerator")
            .field("name", &self.name)
            .field("model", &self.config.model)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}

//! Base LLM trait.
//!
//! Every language-model collaborator, whether a hosted provider, a local
//! Ollama model, or a scripted test double, implements [`BaseLLM`]. The
//! crew treats it as an opaque, potentially slow, potentially failing
//! service: one `call` is one completion, and the agent-turn loop in
//! [`crate::agents::crew_agent_executor`] decides how many calls a turn gets.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::usage_metrics::UsageMetrics;

/// Default context window size in tokens.
pub const DEFAULT_CONTEXT_WINDOW_SIZE: usize = 4096;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LLMMessage {
    pub role: MessageRole,
    pub content: String,
}

impl LLMMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Text returned by one LLM call together with its token usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LLMResponse {
    pub content: String,
    #[serde(default)]
    pub usage: UsageMetrics,
}

impl LLMResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: UsageMetrics::default(),
        }
    }

    pub fn with_usage(mut self, usage: UsageMetrics) -> Self {
        self.usage = usage;
        self
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from LLM calls.
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("model returned an empty response")]
    EmptyResponse,

    /// Any other failure reported by a custom implementation.
    #[error("{0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// BaseLLM trait
// ---------------------------------------------------------------------------

/// Interface every LLM implementation follows.
#[async_trait]
pub trait BaseLLM: Send + Sync + fmt::Debug {
    /// Model identifier, e.g. `tinyllama`.
    fn model(&self) -> &str;

    /// Provider name, e.g. `ollama`.
    fn provider(&self) -> &str {
        "custom"
    }

    /// Whether the provider honors stop sequences server-side. When it does
    /// not, callers truncate with [`apply_stop_words`].
    fn supports_stop_words(&self) -> bool {
        true
    }

    fn context_window_size(&self) -> usize {
        DEFAULT_CONTEXT_WINDOW_SIZE
    }

    /// Run one completion over `messages`, stopping at any of `stop`.
    async fn call(&self, messages: &[LLMMessage], stop: &[String]) -> Result<LLMResponse, LLMError>;
}

/// Truncate `content` at the earliest stop sequence.
pub fn apply_stop_words(content: &str, stop: &[String]) -> String {
    let cut = stop
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| content.find(s.as_str()))
        .min();
    match cut {
        Some(idx) => content[..idx].trim_end().to_string(),
        None => content.to_string(),
    }
}

/// Split a `provider/model` string; a bare model name has no provider.
pub fn extract_provider(model: &str) -> (Option<&str>, &str) {
    match model.split_once('/') {
        Some((provider, name)) if !provider.is_empty() && !name.is_empty() => {
            (Some(provider), name)
        }
        _ => (None, model),
    }
}

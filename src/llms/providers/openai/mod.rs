//! OpenAI-compatible chat completion provider.
//!
//! Works against the OpenAI Chat Completions API and any server exposing
//! the same `/chat/completions` contract (vLLM, LM Studio, Ollama's `/v1`).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llms::base_llm::{apply_stop_words, BaseLLM, LLMError, LLMMessage, LLMResponse};
use crate::llms::providers::utils::post_json_with_retry;
use crate::types::usage_metrics::UsageMetrics;

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI allows at most four stop sequences.
const MAX_STOP_SEQUENCES: usize = 4;

/// OpenAI chat completion implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAICompletion {
    /// Model name, e.g. `gpt-4o-mini`.
    pub model: String,
    /// API key sent as a bearer token.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL.
    pub base_url: String,
    /// Optional sampling temperature.
    pub temperature: Option<f64>,
    /// Maximum tokens in the response.
    pub max_tokens: Option<u32>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum number of retries on transport errors, 429 and 5xx.
    pub max_retries: u32,
}

impl OpenAICompletion {
    /// Create a provider for `model`.
    ///
    /// # Arguments
    ///
    /// * `model` - Model name (e.g., "gpt-4o-mini").
    /// * `api_key` - API key; required by api.openai.com, optional for local servers.
    /// * `base_url` - Optional custom base URL.
    pub fn new(model: impl Into<String>, api_key: Option<String>, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            temperature: None,
            max_tokens: None,
            timeout_secs: 120,
            max_retries: 2,
        }
    }

    /// Builder: set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn is_official_api(&self) -> bool {
        self.base_url == DEFAULT_OPENAI_BASE_URL
    }

    /// Build the request body for the Chat Completions API.
    pub fn build_request_body(&self, messages: &[LLMMessage], stop: &[String]) -> Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(temp) = self.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if !stop.is_empty() {
            let stop: Vec<&String> = stop.iter().take(MAX_STOP_SEQUENCES).collect();
            body["stop"] = serde_json::json!(stop);
        }
        body
    }

    /// Extract the assistant text and token usage from a completion response.
    pub fn parse_response(response: &Value, stop: &[String]) -> Result<LLMResponse, LLMError> {
        let content = response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .ok_or(LLMError::EmptyResponse)?;

        let usage = response.get("usage");
        let prompt_tokens = usage
            .and_then(|u| u.get("prompt_tokens"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let completion_tokens = usage
            .and_then(|u| u.get("completion_tokens"))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        // Stop sequences past the API limit are enforced client-side.
        let content = if stop.len() > MAX_STOP_SEQUENCES {
            apply_stop_words(content, stop)
        } else {
            content.to_string()
        };

        Ok(LLMResponse::new(content)
            .with_usage(UsageMetrics::from_request(prompt_tokens, completion_tokens)))
    }
}

#[async_trait]
impl BaseLLM for OpenAICompletion {
    fn model(&self) -> &str {
        &self.model
    }

    fn provider(&self) -> &str {
        "openai"
    }

    fn context_window_size(&self) -> usize {
        let model = self.model.as_str();
        if model.contains("gpt-4o") {
            128_000
        } else if model.contains("gpt-4.1") {
            1_047_576
        } else if model.contains("gpt-4") {
            8_192
        } else {
            crate::llms::base_llm::DEFAULT_CONTEXT_WINDOW_SIZE
        }
    }

    async fn call(&self, messages: &[LLMMessage], stop: &[String]) -> Result<LLMResponse, LLMError> {
        log::debug!(
            "OpenAICompletion.call: model={}, messages={}",
            self.model,
            messages.len()
        );

        if self.api_key.is_none() && self.is_official_api() {
            return Err(LLMError::Configuration(
                "OpenAI API key not set. Set OPENAI_API_KEY or point OPENAI_BASE_URL at a local server."
                    .to_string(),
            ));
        }

        let body = self.build_request_body(messages, stop);
        let endpoint = format!("{}/chat/completions", self.base_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let response = post_json_with_retry(
            &client,
            &endpoint,
            self.api_key.as_deref(),
            &body,
            self.max_retries,
            "OpenAI",
        )
        .await?;
        Self::parse_response(&response, stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_body_caps_stop_sequences() {
        let llm = OpenAICompletion::new("gpt-4o-mini", Some("sk-test".into()), None);
        let stop: Vec<String> = (0..6).map(|i| format!("s{}", i)).collect();
        let body = llm.build_request_body(&[LLMMessage::user("hi")], &stop);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["stop"].as_array().unwrap().len(), 4);
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_parse_response() {
        let json = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Final Answer: ok"}}],
            "usage": {"prompt_tokens": 20, "completion_tokens": 3, "total_tokens": 23}
        });
        let resp = OpenAICompletion::parse_response(&json, &[]).unwrap();
        assert_eq!(resp.content, "Final Answer: ok");
        assert_eq!(resp.usage.total_tokens, 23);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let json = serde_json::json!({"choices": []});
        assert!(matches!(
            OpenAICompletion::parse_response(&json, &[]),
            Err(LLMError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_call_without_key_against_official_api_fails_fast() {
        let llm = OpenAICompletion::new("gpt-4o-mini", None, None);
        let err = llm.call(&[LLMMessage::user("hi")], &[]).await.unwrap_err();
        assert!(matches!(err, LLMError::Configuration(_)));
    }

    #[test]
    fn test_context_window_size() {
        let llm = OpenAICompletion::new("gpt-4o-mini", None, None);
        assert_eq!(llm.context_window_size(), 128_000);
    }
}

//! Ollama completion provider.
//!
//! Talks to a locally hosted Ollama server through its `/api/chat`
//! endpoint with streaming disabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llms::base_llm::{BaseLLM, LLMError, LLMMessage, LLMResponse};
use crate::llms::providers::utils::post_json_with_retry;
use crate::types::usage_metrics::UsageMetrics;

/// Default Ollama server address.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Local models are slow; allow generous time per completion.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Ollama chat completion implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaCompletion {
    /// Model name as known to Ollama, e.g. `tinyllama`.
    pub model: String,
    /// Server base URL.
    pub base_url: String,
    /// Optional sampling temperature.
    pub temperature: Option<f64>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum number of retries on transport errors, 429 and 5xx.
    pub max_retries: u32,
    #[serde(skip)]
    client: reqwest::Client,
}

impl OllamaCompletion {
    /// Create a provider for `model`, using `base_url` or the default
    /// local server.
    pub fn new(model: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            temperature: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: 2,
            client: reqwest::Client::new(),
        }
    }

    /// Builder: set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Build the `/api/chat` request body.
    pub fn build_request_body(&self, messages: &[LLMMessage], stop: &[String]) -> Value {
        let mut options = serde_json::Map::new();
        if let Some(temp) = self.temperature {
            options.insert("temperature".into(), serde_json::json!(temp));
        }
        if !stop.is_empty() {
            options.insert("stop".into(), serde_json::json!(stop));
        }

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });
        if !options.is_empty() {
            body["options"] = Value::Object(options);
        }
        body
    }

    /// Extract the assistant text and token counts from a chat response.
    pub fn parse_response(response: &Value) -> Result<LLMResponse, LLMError> {
        if let Some(error) = response.get("error").and_then(Value::as_str) {
            return Err(LLMError::Other(format!("Ollama error: {}", error)));
        }

        let content = response
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .ok_or(LLMError::EmptyResponse)?;

        let prompt_tokens = response
            .get("prompt_eval_count")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let completion_tokens = response
            .get("eval_count")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        Ok(LLMResponse::new(content)
            .with_usage(UsageMetrics::from_request(prompt_tokens, completion_tokens)))
    }
}

#[async_trait]
impl BaseLLM for OllamaCompletion {
    fn model(&self) -> &str {
        &self.model
    }

    fn provider(&self) -> &str {
        "ollama"
    }

    async fn call(&self, messages: &[LLMMessage], stop: &[String]) -> Result<LLMResponse, LLMError> {
        log::debug!(
            "OllamaCompletion.call: model={}, messages={}",
            self.model,
            messages.len()
        );

        let body = self.build_request_body(messages, stop);
        let endpoint = format!("{}/api/chat", self.base_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .unwrap_or_else(|_| self.client.clone());

        let response =
            post_json_with_retry(&client, &endpoint, None, &body, self.max_retries, "Ollama")
                .await?;
        Self::parse_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_base_url() {
        let llm = OllamaCompletion::new("tinyllama", Some("http://gpu-box:11434/".into()));
        assert_eq!(llm.base_url, "http://gpu-box:11434");
        assert_eq!(llm.provider(), "ollama");
    }

    #[test]
    fn test_build_request_body() {
        let llm = OllamaCompletion::new("tinyllama", None).with_temperature(0.2);
        let body = llm.build_request_body(
            &[LLMMessage::system("sys"), LLMMessage::user("hi")],
            &["\nObservation:".to_string()],
        );
        assert_eq!(body["model"], "tinyllama");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["options"]["stop"][0], "\nObservation:");
        assert_eq!(body["options"]["temperature"], 0.2);
    }

    #[test]
    fn test_build_request_body_without_options() {
        let llm = OllamaCompletion::new("tinyllama", None);
        let body = llm.build_request_body(&[LLMMessage::user("hi")], &[]);
        assert!(body.get("options").is_none());
    }

    #[test]
    fn test_parse_response() {
        let json = serde_json::json!({
            "model": "tinyllama",
            "message": {"role": "assistant", "content": "Final Answer: 42"},
            "done": true,
            "prompt_eval_count": 12,
            "eval_count": 4
        });
        let resp = OllamaCompletion::parse_response(&json).unwrap();
        assert_eq!(resp.content, "Final Answer: 42");
        assert_eq!(resp.usage.total_tokens, 16);
        assert_eq!(resp.usage.successful_requests, 1);
    }

    #[test]
    fn test_parse_error_response() {
        let json = serde_json::json!({"error": "model 'tinyllama' not found"});
        let err = OllamaCompletion::parse_response(&json).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_parse_missing_message() {
        let json = serde_json::json!({"done": true});
        assert!(matches!(
            OllamaCompletion::parse_response(&json),
            Err(LLMError::EmptyResponse)
        ));
    }
}

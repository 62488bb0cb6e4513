//! Base tool definitions.
//!
//! Provides the core tool abstractions: `EnvVar`, the [`BaseTool`] trait and
//! the concrete [`Tool`] struct that wraps a callable function.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// EnvVar
// ---------------------------------------------------------------------------

/// Environment variable definition used by a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Name of the environment variable.
    pub name: String,
    /// Human-readable description of the environment variable.
    pub description: String,
    /// Whether the environment variable is required.
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

impl EnvVar {
    /// Create a new required environment variable.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ToolError
// ---------------------------------------------------------------------------

/// Failure raised by a tool's own execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// HTTP transport failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the remote service.
    #[error("service returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Required environment variable or credential is absent.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// Input could not be used by the tool.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Any other failure.
    #[error("{0}")]
    Execution(String),
}

// ---------------------------------------------------------------------------
// BaseTool trait
// ---------------------------------------------------------------------------

/// Trait for every capability an agent may invoke during its turn.
///
/// Implementors provide `name`, `description` and `run`. The name is the
/// ToolRef agents and tasks use to reference the tool.
#[async_trait]
pub trait BaseTool: Send + Sync + fmt::Debug {
    /// The unique name of the tool that clearly communicates its purpose.
    fn name(&self) -> &str;

    /// Description used to tell the model how/when/why to use the tool.
    fn description(&self) -> &str;

    /// List of environment variables used by the tool.
    fn env_vars(&self) -> &[EnvVar] {
        &[]
    }

    /// Whether a result for `input` may be reused within a run.
    fn should_cache(&self, _input: &str, _output: &str) -> bool {
        true
    }

    /// Execute the tool with the raw `Action Input` text.
    async fn run(&self, input: &str) -> Result<String, ToolError>;
}

// ---------------------------------------------------------------------------
// Tool struct (wraps a callable function)
// ---------------------------------------------------------------------------

/// Type alias for a shared synchronous tool function.
pub type ToolFn = Arc<dyn Fn(&str) -> Result<String, ToolError> + Send + Sync>;

/// Concrete tool that wraps a callable function.
#[derive(Clone)]
pub struct Tool {
    tool_name: String,
    tool_description: String,
    cache_results: bool,
    func: ToolFn,
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.tool_name)
            .field("description", &self.tool_description)
            .field("cache_results", &self.cache_results)
            .finish()
    }
}

impl Tool {
    /// Create a new `Tool` wrapping `func`.
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self {
            tool_name: name.into(),
            tool_description: description.into(),
            cache_results: true,
            func: Arc::new(func),
        }
    }

    /// Builder: disable result caching for this tool.
    pub fn without_cache(mut self) -> Self {
        self.cache_results = false;
        self
    }
}

#[async_trait]
impl BaseTool for Tool {
    fn name(&self) -> &str {
        &self.tool_name
    }

    fn description(&self) -> &str {
        &self.tool_description
    }

    fn should_cache(&self, _input: &str, _output: &str) -> bool {
        self.cache_results
    }

    async fn run(&self, input: &str) -> Result<String, ToolError> {
        (self.func)(input)
    }
}

/// Extract the argument from an `Action Input`.
///
/// Models answer either with plain text or with a JSON object such as
/// `{"search_query": "..."}`. For an object, the first of `keys` holding a
/// string wins, then any string field; anything else is used verbatim.
pub fn action_input_value(input: &str, keys: &[&str]) -> String {
    let trimmed = input.trim();
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(trimmed) {
        let found = keys
            .iter()
            .find_map(|k| map.get(*k).and_then(|v| v.as_str()))
            .or_else(|| map.values().find_map(|v| v.as_str()));
        if let Some(value) = found {
            return value.trim().to_string();
        }
    }
    trimmed.trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tool_runs_closure() {
        let tool = Tool::new("echo", "Echo the input back", |input: &str| {
            Ok(format!("echo: {}", input))
        });
        assert_eq!(tool.name(), "echo");
        assert_eq!(tool.run("hello").await.unwrap(), "echo: hello");
        assert!(tool.should_cache("hello", "echo: hello"));
    }

    #[tokio::test]
    async fn test_tool_error_propagates() {
        let tool = Tool::new("broken", "Always fails", |_: &str| {
            Err(ToolError::Execution("boom".into()))
        })
        .without_cache();
        let err = tool.run("x").await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(!tool.should_cache("x", ""));
    }

    #[test]
    fn test_env_var_defaults_required() {
        let var: EnvVar =
            serde_json::from_str(r#"{"name":"SERPER_API_KEY","description":"key"}"#).unwrap();
        assert!(var.required);
        assert_eq!(var, EnvVar::new("SERPER_API_KEY", "key"));
    }

    #[test]
    fn test_action_input_value() {
        assert_eq!(action_input_value(" plain query ", &["q"]), "plain query");
        assert_eq!(action_input_value("\"quoted\"", &["q"]), "quoted");
        assert_eq!(
            action_input_value(r#"{"other": "x", "search_query": "rust"}"#, &["search_query"]),
            "rust"
        );
        assert_eq!(action_input_value(r#"{"url": "a.com"}"#, &["website_url"]), "a.com");
        assert_eq!(action_input_value(r#"{"n": 1}"#, &["q"]), r#"{"n": 1}"#);
    }
}

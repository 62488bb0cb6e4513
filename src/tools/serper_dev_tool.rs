//! Web search through the serper.dev Google Search API.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::base_tool::{action_input_value, BaseTool, EnvVar, ToolError};

/// serper.dev search endpoint.
pub const SERPER_SEARCH_URL: &str = "https://google.serper.dev/search";

/// Search the internet for a query and return the top organic results.
#[derive(Debug, Clone)]
pub struct SerperDevTool {
    api_key: Option<String>,
    endpoint: String,
    n_results: usize,
    env_vars: Vec<EnvVar>,
}

impl SerperDevTool {
    /// Create the tool. Without a key every call fails with
    /// [`ToolError::MissingCredential`].
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            endpoint: SERPER_SEARCH_URL.to_string(),
            n_results: 10,
            env_vars: vec![EnvVar::new(
                "SERPER_API_KEY",
                "API key for serper.dev search",
            )],
        }
    }

    /// Builder: point the tool at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Builder: number of results to request.
    pub fn with_n_results(mut self, n_results: usize) -> Self {
        self.n_results = n_results.max(1);
        self
    }

    /// Render the organic results of a serper.dev response.
    pub fn format_results(response: &Value, limit: usize) -> String {
        let organic = response
            .get("organic")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if organic.is_empty() {
            return "No results found.".to_string();
        }

        organic
            .iter()
            .take(limit)
            .map(|item| {
                let field = |k: &str| item.get(k).and_then(Value::as_str).unwrap_or("");
                format!(
                    "Title: {}\nLink: {}\nSnippet: {}\n---",
                    field("title"),
                    field("link"),
                    field("snippet")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl BaseTool for SerperDevTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the internet with a query and return titles, links and snippets \
         of the top results. Input: the search query."
    }

    fn env_vars(&self) -> &[EnvVar] {
        &self.env_vars
    }

    async fn run(&self, input: &str) -> Result<String, ToolError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::MissingCredential("SERPER_API_KEY is not set".into()))?;
        let query = action_input_value(input, &["search_query", "query", "q"]);
        if query.is_empty() {
            return Err(ToolError::InvalidInput("empty search query".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let response = client
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .json(&serde_json::json!({ "q": query, "num": self.n_results }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ToolError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        Ok(Self::format_results(&body, self.n_results))
    }
}

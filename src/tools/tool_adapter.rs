//! Tool Invocation Adapter.
//!
//! Maps ToolRef names to the tools behind them. Agents and tasks only ever
//! carry names; the adapter is the one place a name becomes a call.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Settings;
use crate::tools::base_tool::BaseTool;
use crate::tools::scrape_website_tool::ScrapeWebsiteTool;
use crate::tools::serper_dev_tool::SerperDevTool;
use crate::utilities::errors::ToolInvocationError;

/// Registry of invocable tools keyed by ToolRef.
#[derive(Debug, Clone, Default)]
pub struct ToolAdapter {
    tools: BTreeMap<String, Arc<dyn BaseTool>>,
}

impl ToolAdapter {
    /// Create an empty adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adapter with the built-in `search` and `scrape` tools.
    pub fn with_default_tools(settings: &Settings) -> Self {
        let mut adapter = Self::new();
        adapter.register(Arc::new(SerperDevTool::new(settings.serper_api_key.clone())));
        adapter.register(Arc::new(ScrapeWebsiteTool::new()));
        adapter
    }

    /// Register a tool under its own name. A later registration under the
    /// same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn BaseTool>) {
        let name = tool.name().to_string();
        self.register_as(name, tool);
    }

    /// Register a tool under an explicit ToolRef.
    pub fn register_as(&mut self, tool_ref: impl Into<String>, tool: Arc<dyn BaseTool>) {
        let tool_ref = tool_ref.into();
        if self.tools.insert(tool_ref.clone(), tool).is_some() {
            log::warn!("Tool '{}' was registered twice; keeping the latest", tool_ref);
        }
    }

    /// Builder form of [`ToolAdapter::register`].
    pub fn with_tool(mut self, tool: Arc<dyn BaseTool>) -> Self {
        self.register(tool);
        self
    }

    /// Whether `tool_ref` resolves to a tool.
    pub fn contains(&self, tool_ref: &str) -> bool {
        self.tools.contains_key(tool_ref)
    }

    /// Look up a tool.
    pub fn get(&self, tool_ref: &str) -> Option<&Arc<dyn BaseTool>> {
        self.tools.get(tool_ref)
    }

    /// Registered ToolRefs, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Render the prompt block describing `tool_refs`.
    ///
    /// Unknown refs are skipped; configuration validation reports them.
    pub fn describe(&self, tool_refs: &[String]) -> String {
        tool_refs
            .iter()
            .filter_map(|name| self.tools.get(name).map(|tool| (name, tool)))
            .map(|(name, tool)| format!("Tool Name: {}\nTool Description: {}", name, tool.description()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Invoke `tool_ref` with `query`.
    ///
    /// No retry happens here; retrying is the tool's own concern.
    pub async fn invoke(&self, tool_ref: &str, query: &str) -> Result<String, ToolInvocationError> {
        let tool = self.tools.get(tool_ref).ok_or_else(|| {
            ToolInvocationError::new(tool_ref, "no tool is registered under this name")
        })?;
        log::debug!("Invoking tool '{}' with input: {}", tool_ref, query);
        tool.run(query).await.map_err(|e| {
            log::warn!("Tool '{}' failed: {}", tool_ref, e);
            ToolInvocationError::new(tool_ref, e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::base_tool::{Tool, ToolError};

    fn adapter() -> ToolAdapter {
        ToolAdapter::new()
            .with_tool(Arc::new(Tool::new("upper", "Uppercase the input", |s: &str| {
                Ok(s.to_uppercase())
            })))
            .with_tool(Arc::new(Tool::new("down", "Always unavailable", |_: &str| {
                Err(ToolError::Status {
                    status: 503,
                    message: "unavailable".into(),
                })
            })))
    }

    #[test]
    fn test_invoke_success() {
        let out = tokio_test::block_on(adapter().invoke("upper", "venue")).unwrap();
        assert_eq!(out, "VENUE");
    }

    #[test]
    fn test_invoke_failure_maps_to_invocation_error() {
        let err = tokio_test::block_on(adapter().invoke("down", "q")).unwrap_err();
        assert_eq!(err.tool, "down");
        assert!(err.message.contains("503"));
    }

    #[test]
    fn test_invoke_unknown_tool() {
        let err = tokio_test::block_on(adapter().invoke("nope", "q")).unwrap_err();
        assert_eq!(err.tool, "nope");
    }

    #[test]
    fn test_describe_and_names() {
        let adapter = adapter();
        assert!(adapter.contains("upper"));
        assert_eq!(adapter.names().collect::<Vec<_>>(), vec!["down", "upper"]);
        let text = adapter.describe(&["upper".to_string(), "missing".to_string()]);
        assert_eq!(text, "Tool Name: upper\nTool Description: Uppercase the input");
    }

    #[test]
    fn test_default_tools() {
        let adapter = ToolAdapter::with_default_tools(&Settings::default());
        assert!(adapter.contains("search"));
        assert!(adapter.contains("scrape"));
    }
}

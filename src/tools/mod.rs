//! Tools system for agents.
//!
//! This module provides the tools infrastructure: the base tool trait, the
//! Tool Invocation Adapter, the built-in search and scrape tools, and the
//! manager's delegation tool.

pub mod agent_tools;
pub mod base_tool;
pub mod scrape_website_tool;
pub mod serper_dev_tool;
pub mod tool_adapter;

// Re-exports for convenience
pub use base_tool::{BaseTool, EnvVar, Tool, ToolError};
pub use scrape_website_tool::ScrapeWebsiteTool;
pub use serper_dev_tool::SerperDevTool;
pub use tool_adapter::ToolAdapter;

//! Agent turn machinery.
//!
//! This module provides the executor that runs one agent turn, the ReAct
//! output parser, and the run-local tool cache.

pub mod cache;
pub mod crew_agent_executor;
pub mod parser;

// Re-exports for convenience
pub use cache::cache_handler::CacheHandler;
pub use crew_agent_executor::CrewAgentExecutor;
pub use parser::{AgentAction, AgentFinish, OutputParserError, ParseResult};

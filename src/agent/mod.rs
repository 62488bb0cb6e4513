//! Agents and the Agent Registry.
//!
//! This module contains the `Agent` struct, which runs task turns through
//! [`crate::agents::CrewAgentExecutor`], and the registry crews look agents
//! up in.

pub mod core;
pub mod registry;

// Re-export the main Agent type.
pub use self::core::{Agent, AgentTurnOutput, TurnResources, DEFAULT_MAX_ITER};
pub use self::registry::AgentRegistry;

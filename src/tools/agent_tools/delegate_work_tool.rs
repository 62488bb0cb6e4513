//! Delegate work tool.
//!
//! The hierarchical manager's only action. It names a coworker and hands it
//! a task plus context; the crew executes the resulting worker turn.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool name as it appears in the manager's `Action:` line.
pub const DELEGATE_WORK_TOOL_NAME: &str = "Delegate work to coworker";

/// Schema for delegate work tool arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateWorkToolSchema {
    /// The task to delegate.
    pub task: String,
    /// The context for the task.
    #[serde(default)]
    pub context: String,
    /// The role/name of the coworker to delegate to.
    pub coworker: String,
}

/// Tool for delegating work to coworkers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateWorkTool {
    /// Tool name.
    pub name: String,
    /// Roles of the coworkers that may receive work.
    pub coworker_names: Vec<String>,
}

impl DelegateWorkTool {
    /// Create a new `DelegateWorkTool` over the given coworker roles.
    pub fn new(coworker_names: Vec<String>) -> Self {
        Self {
            name: DELEGATE_WORK_TOOL_NAME.to_string(),
            coworker_names,
        }
    }

    /// Tool description shown to the manager.
    pub fn description(&self) -> String {
        format!(
            "Delegate a specific task to one of the following coworkers: {}\n\
             The input to this tool should be the coworker, the task you want them to do, \
             and ALL necessary context to execute the task, they know nothing about the task, \
             so share absolutely everything you know, don't reference things but instead explain them.",
            self.coworker_names.join(", ")
        )
    }

    /// Get the JSON schema for the tool's arguments.
    pub fn args_schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task": {
                    "type": "string",
                    "description": "The task to delegate"
                },
                "context": {
                    "type": "string",
                    "description": "The context for the task"
                },
                "coworker": {
                    "type": "string",
                    "description": "The role/name of the coworker to delegate to"
                }
            },
            "required": ["task", "context", "coworker"]
        })
    }

    /// Parse an `Action Input` into delegation arguments.
    ///
    /// On failure the returned message is meant to be shown to the manager
    /// as an observation.
    pub fn parse_input(input: &str) -> Result<DelegateWorkToolSchema, String> {
        serde_json::from_str::<DelegateWorkToolSchema>(input.trim()).map_err(|e| {
            format!(
                "Error: the Action Input is not a valid JSON object with \"task\", \"context\" \
                 and \"coworker\" keys ({}). Schema: {}",
                e,
                Self::args_schema()
            )
        })
    }

    /// Resolve `coworker` to a registered role.
    ///
    /// Names match case-insensitively with whitespace and quotes normalized.
    pub fn resolve_coworker(&self, coworker: &str) -> Result<&str, String> {
        let sanitized_coworker = sanitize_agent_name(coworker);
        self.coworker_names
            .iter()
            .find(|name| sanitize_agent_name(name) == sanitized_coworker)
            .map(String::as_str)
            .ok_or_else(|| {
                let available = self
                    .coworker_names
                    .iter()
                    .map(|n| format!("- {}", n))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!(
                    "Coworker '{}' not found. Available coworkers:\n{}",
                    coworker.trim(),
                    available
                )
            })
    }
}

/// Sanitize an agent role name by normalizing whitespace and converting to lowercase.
pub fn sanitize_agent_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('"', "")
        .to_lowercase()
}

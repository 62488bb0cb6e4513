//! Process types for crew execution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Represents the different processes that can be used to tackle tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    /// Tasks are executed one after another in order.
    #[default]
    Sequential,
    /// A manager agent delegates tasks to other agents.
    Hierarchical,
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Process::Sequential => write!(f, "sequential"),
            Process::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

impl FromStr for Process {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(Process::Sequential),
            "hierarchical" => Ok(Process::Hierarchical),
            other => Err(format!(
                "unknown process '{}'; expected 'sequential' or 'hierarchical'",
                other
            )),
        }
    }
}

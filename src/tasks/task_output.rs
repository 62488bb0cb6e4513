//! Task output representation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{summarize, Task};

/// The result of one task. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Rendered description of the task.
    pub description: String,
    /// Name of the task.
    pub name: Option<String>,
    /// Rendered expected output of the task.
    pub expected_output: String,
    /// First ten words of the description.
    pub summary: String,
    /// Raw output of the task.
    pub raw: String,
    /// Role of the agent that produced the output.
    pub agent: String,
    /// Role of the manager that delegated the task, in hierarchical crews.
    #[serde(default)]
    pub delegated_by: Option<String>,
    /// Agent turns spent on the task, including a failed one before a
    /// reassignment.
    pub attempts: u32,
    /// When the task finished.
    pub completed_at: DateTime<Utc>,
}

impl TaskOutput {
    /// Output of `task` (already rendered) produced by `agent`.
    pub fn new(task: &Task, agent: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            description: task.description.clone(),
            name: task.name.clone(),
            expected_output: task.expected_output.clone(),
            summary: Self::generate_summary(&task.description),
            raw: raw.into(),
            agent: agent.into(),
            delegated_by: None,
            attempts: 1,
            completed_at: Utc::now(),
        }
    }

    /// Builder: record the delegating manager.
    pub fn with_delegated_by(mut self, manager: impl Into<String>) -> Self {
        self.delegated_by = Some(manager.into());
        self
    }

    /// Builder: record the number of agent turns spent.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Generate a summary from the description (first 10 words + "...").
    fn generate_summary(description: &str) -> String {
        let summary = summarize(description, 10);
        if summary.ends_with("...") {
            summary
        } else {
            format!("{}...", summary)
        }
    }
}

impl fmt::Display for TaskOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_output_from_task() {
        let task = Task::new(
            "Research the latest developments in AI in healthcare and summarize them for clinicians",
            "A report",
        )
        .with_name("research");
        let output = TaskOutput::new(&task, "Research Analyst", "Findings")
            .with_delegated_by("Crew Manager")
            .with_attempts(2);

        assert_eq!(
            output.summary,
            "Research the latest developments in AI in healthcare and summarize..."
        );
        assert_eq!(output.name.as_deref(), Some("research"));
        assert_eq!(output.delegated_by.as_deref(), Some("Crew Manager"));
        assert_eq!(output.attempts, 2);
        assert_eq!(output.to_string(), "Findings");
    }

    #[test]
    fn test_short_description_summary() {
        let output = TaskOutput::new(&Task::new("Find venues", "List"), "Finder", "x");
        assert_eq!(output.summary, "Find venues...");
        assert_eq!(output.attempts, 1);
        assert!(output.delegated_by.is_none());
    }
}

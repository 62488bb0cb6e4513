//! Crew output representation.
//!
//! The PipelineResult: every task output in execution order, with the last
//! one designated as the crew's raw output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tasks::task_output::TaskOutput;
use crate::types::usage_metrics::UsageMetrics;

/// Class that represents the result of a crew.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewOutput {
    /// Raw output of crew (the final task's raw text).
    pub raw: String,
    /// Output of each task, in execution order.
    pub tasks_output: Vec<TaskOutput>,
    /// Processed token summary.
    pub token_usage: UsageMetrics,
}

impl CrewOutput {
    /// Create a new CrewOutput; `raw` is taken from the last task output.
    pub fn new(tasks_output: Vec<TaskOutput>, token_usage: UsageMetrics) -> Self {
        let raw = tasks_output
            .last()
            .map(|o| o.raw.clone())
            .unwrap_or_default();
        Self {
            raw,
            tasks_output,
            token_usage,
        }
    }

    /// Result Aggregator: the last task's output as plain text.
    pub fn finalize(&self) -> String {
        self.raw.trim().to_string()
    }

    /// Number of task outputs.
    pub fn len(&self) -> usize {
        self.tasks_output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks_output.is_empty()
    }
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    #[test]
    fn test_raw_is_last_task_output() {
        let t = Task::new("d", "e");
        let output = CrewOutput::new(
            vec![
                TaskOutput::new(&t, "A", "first"),
                TaskOutput::new(&t, "B", "  # Final report\n"),
            ],
            UsageMetrics::from_request(1, 1),
        );
        assert_eq!(output.len(), 2);
        assert_eq!(output.raw, "  # Final report\n");
        assert_eq!(output.finalize(), "# Final report");
    }

    #[test]
    fn test_empty_output() {
        let output = CrewOutput::new(Vec::new(), UsageMetrics::default());
        assert!(output.is_empty());
        assert_eq!(output.finalize(), "");
    }
}

//! Task Graph.
//!
//! The ordered list of tasks a crew runs. Order defines execution order and
//! which earlier outputs a task sees as context.

use serde::{Deserialize, Serialize};

use crate::agent::registry::AgentRegistry;
use crate::context::ExecutionContext;
use crate::process::Process;
use crate::task::Task;
use crate::tools::tool_adapter::ToolAdapter;
use crate::utilities::errors::{ConfigurationError, MissingInputError};
use crate::utilities::string_utils::missing_variables;

/// Ordered tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskGraph {
    tasks: Vec<Task>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `task`.
    pub fn add(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Builder form of [`TaskGraph::add`].
    pub fn with_task(mut self, task: Task) -> Self {
        self.add(task);
        self
    }

    /// Tasks in execution order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Check task-to-agent assignments against `registry` for `process`.
    ///
    /// # Errors
    ///
    /// - Sequential: [`ConfigurationError::UnassignedAgent`] for a task with
    ///   no agent, [`ConfigurationError::UnknownAgent`] for one naming an
    ///   unregistered role.
    /// - Hierarchical: [`ConfigurationError::PreassignedAgent`] for a task
    ///   that names an agent.
    pub fn validate(
        &self,
        registry: &AgentRegistry,
        process: Process,
    ) -> Result<(), ConfigurationError> {
        for task in &self.tasks {
            match (process, task.agent.as_deref()) {
                (Process::Sequential, None) => {
                    return Err(ConfigurationError::UnassignedAgent { task: task.label() });
                }
                (Process::Sequential, Some(role)) => {
                    registry.get(role)?;
                }
                (Process::Hierarchical, Some(role)) => {
                    return Err(ConfigurationError::PreassignedAgent {
                        task: task.label(),
                        role: role.to_string(),
                    });
                }
                (Process::Hierarchical, None) => {}
            }
        }
        Ok(())
    }

    /// Check every task tool override against `tools`.
    pub fn validate_tools(&self, tools: &ToolAdapter) -> Result<(), ConfigurationError> {
        for task in &self.tasks {
            if let Some(unknown) = task
                .tools
                .iter()
                .flatten()
                .find(|t| !tools.contains(t))
            {
                return Err(ConfigurationError::UnknownTool {
                    owner: task.label(),
                    tool: unknown.clone(),
                });
            }
        }
        Ok(())
    }

    /// Placeholders referenced by any task that `context` does not cover,
    /// in order of first appearance.
    pub fn missing_inputs(&self, context: &ExecutionContext) -> Vec<String> {
        missing_variables(self.tasks.iter().flat_map(Task::templates), &context.inputs)
    }

    /// Substitute placeholders in one task.
    pub fn render(&self, task: &Task, context: &ExecutionContext) -> Result<Task, MissingInputError> {
        task.interpolated(context)
    }

    /// Render every task, or fail naming every placeholder missing from
    /// any of them.
    pub fn render_all(&self, context: &ExecutionContext) -> Result<Vec<Task>, MissingInputError> {
        let missing = self.missing_inputs(context);
        if !missing.is_empty() {
            return Err(MissingInputError::new(missing));
        }
        self.tasks.iter().map(|t| self.render(t, context)).collect()
    }
}

impl FromIterator<Task> for TaskGraph {
    fn from_iter<T: IntoIterator<Item = Task>>(iter: T) -> Self {
        Self {
            tasks: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;

    fn registry() -> AgentRegistry {
        AgentRegistry::new()
            .with_agent(Agent::new("X", "x", "x"))
            .unwrap()
    }

    #[test]
    fn test_sequential_validation() {
        let graph = TaskGraph::new().with_task(Task::new("t1", "o").with_agent("X"));
        assert!(graph.validate(&registry(), Process::Sequential).is_ok());

        let unassigned = TaskGraph::new().with_task(Task::new("t1", "o"));
        assert!(matches!(
            unassigned.validate(&registry(), Process::Sequential),
            Err(ConfigurationError::UnassignedAgent { task }) if task == "t1"
        ));

        let unknown = TaskGraph::new().with_task(Task::new("t1", "o").with_agent("Y"));
        assert!(matches!(
            unknown.validate(&registry(), Process::Sequential),
            Err(ConfigurationError::UnknownAgent { role }) if role == "Y"
        ));
    }

    #[test]
    fn test_hierarchical_validation() {
        let graph = TaskGraph::new().with_task(Task::new("t1", "o"));
        assert!(graph.validate(&registry(), Process::Hierarchical).is_ok());

        let preassigned = TaskGraph::new().with_task(Task::new("t1", "o").with_agent("X"));
        assert!(matches!(
            preassigned.validate(&registry(), Process::Hierarchical),
            Err(ConfigurationError::PreassignedAgent { role, .. }) if role == "X"
        ));
    }

    #[test]
    fn test_validate_tools() {
        let tools = ToolAdapter::new();
        let graph = TaskGraph::new().with_task(Task::new("t1", "o").with_tools(["search"]));
        assert!(matches!(
            graph.validate_tools(&tools),
            Err(ConfigurationError::UnknownTool { tool, .. }) if tool == "search"
        ));
    }

    #[test]
    fn test_render_all_reports_every_missing_placeholder() {
        let graph: TaskGraph = vec![
            Task::new("Find venues for {conference_name}", "List"),
            Task::new("Check {requirements} in {city}", "Report on {conference_name}"),
        ]
        .into_iter()
        .collect();
        let ctx = ExecutionContext::default().with_input("conference_name", "RustConf");

        let err = graph.render_all(&ctx).unwrap_err();
        assert_eq!(err.missing, vec!["requirements", "city"]);

        let ctx = ctx
            .with_input("requirements", "500 seats")
            .with_input("city", "Lisbon");
        let rendered = graph.render_all(&ctx).unwrap();
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[1].description, "Check 500 seats in Lisbon");
        // The graph itself keeps its templates.
        assert_eq!(graph.tasks()[1].description, "Check {requirements} in {city}");
    }

    #[test]
    fn test_render_single_task() {
        let graph = TaskGraph::new();
        let task = Task::new("About {topic}", "x");
        let ctx = ExecutionContext::default().with_input("topic", "Rust");
        assert_eq!(graph.render(&task, &ctx).unwrap().description, "About Rust");
    }
}

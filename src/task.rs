//! Main Task struct.
//!
//! A task is a description template, an expected-output description, and
//! optionally the role of the agent that must perform it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::ExecutionContext;
use crate::utilities::errors::{ExecutionError, MissingInputError};
use crate::utilities::prompts::slices;
use crate::utilities::string_utils::missing_variables;

fn default_true() -> bool {
    true
}

/// Represents a task to be executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier for the task.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Optional name for the task.
    #[serde(default)]
    pub name: Option<String>,
    /// Descriptive text detailing the task's purpose. May contain
    /// `{placeholders}`.
    pub description: String,
    /// Clear definition of expected task outcome. May contain
    /// `{placeholders}`.
    pub expected_output: String,
    /// Role of the agent responsible for execution. Required in sequential
    /// crews, forbidden in hierarchical ones.
    #[serde(default)]
    pub agent: Option<String>,
    /// Tools the agent is limited to for this task. `None` means the
    /// agent's own tools.
    #[serde(default)]
    pub tools: Option<Vec<String>>,
    /// Instruct the agent to format its final answer in Markdown.
    #[serde(default)]
    pub markdown: bool,
    /// File path for storing task output. May contain `{placeholders}`.
    #[serde(default)]
    pub output_file: Option<String>,
    /// Whether to create the directory for output_file if it doesn't exist.
    #[serde(default = "default_true")]
    pub create_directory: bool,
}

impl Task {
    /// Create a new task.
    pub fn new(description: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            description: description.into(),
            expected_output: expected_output.into(),
            agent: None,
            tools: None,
            markdown: false,
            output_file: None,
            create_directory: true,
        }
    }

    /// Builder: set the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: assign the task to the agent with `role`.
    pub fn with_agent(mut self, role: impl Into<String>) -> Self {
        self.agent = Some(role.into());
        self
    }

    /// Builder: restrict the task to `tools`.
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    /// Builder: request Markdown output.
    pub fn with_markdown(mut self, markdown: bool) -> Self {
        self.markdown = markdown;
        self
    }

    /// Builder: write the output to `path` once the task completes.
    pub fn with_output_file(mut self, path: impl Into<String>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Short label for logs and errors: the name, or the start of the
    /// description.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => summarize(&self.description, 8),
        }
    }

    /// Templates that may reference run inputs.
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        [Some(self.description.as_str()), Some(self.expected_output.as_str()), self.output_file.as_deref()]
            .into_iter()
            .flatten()
    }

    /// Copy of the task with every placeholder substituted.
    ///
    /// # Errors
    ///
    /// [`MissingInputError`] naming every placeholder `context` lacks.
    pub fn interpolated(&self, context: &ExecutionContext) -> Result<Task, MissingInputError> {
        let missing = missing_variables(self.templates(), &context.inputs);
        if !missing.is_empty() {
            return Err(MissingInputError::new(missing));
        }

        Ok(Task {
            description: context.interpolate(&self.description)?,
            expected_output: context.interpolate(&self.expected_output)?,
            output_file: self
                .output_file
                .as_deref()
                .map(|f| context.interpolate(f))
                .transpose()?,
            ..self.clone()
        })
    }

    /// Generate the task prompt.
    ///
    /// When the markdown attribute is true, instructions for formatting the
    /// response in Markdown syntax will be added to the prompt.
    pub fn prompt(&self) -> String {
        let mut tasks_slices = vec![
            self.description.clone(),
            format!("Expected Output: {}", self.expected_output),
        ];

        if self.markdown {
            tasks_slices.push(slices::MARKDOWN.to_string());
        }

        tasks_slices.join("\n")
    }

    /// Save task output to `output_file`, if set.
    pub fn save_file(&self, result: &str) -> Result<(), ExecutionError> {
        let Some(output_file) = self.output_file.as_deref() else {
            return Ok(());
        };
        let io_err = |source| ExecutionError::OutputFile {
            path: output_file.to_string(),
            source,
        };

        let path = Path::new(output_file);
        if self.create_directory {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        std::fs::write(path, result).map_err(io_err)?;
        log::info!("Saved output of task '{}' to {}", self.label(), output_file);
        Ok(())
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Task(description={}, expected_output={})",
            self.description, self.expected_output
        )
    }
}

/// First `words` words of `text`, with "..." when truncated.
pub(crate) fn summarize(text: &str, words: usize) -> String {
    let mut iter = text.split_whitespace();
    let head: Vec<&str> = iter.by_ref().take(words).collect();
    if iter.next().is_some() {
        format!("{}...", head.join(" "))
    } else {
        head.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ExecutionContext {
        ExecutionContext::default()
            .with_input("topic", "AI in healthcare")
            .with_input("year", "2024")
    }

    #[test]
    fn test_prompt_with_markdown() {
        let task = Task::new("Research {topic}", "A report").with_markdown(true);
        let prompt = task.prompt();
        assert!(prompt.starts_with("Research {topic}\nExpected Output: A report\n"));
        assert!(prompt.contains("formatted in Markdown syntax"));
        assert!(!Task::new("a", "b").prompt().contains("Markdown"));
    }

    #[test]
    fn test_interpolated_substitutes_every_field() {
        let task = Task::new("Research {topic}", "Report for {year}")
            .with_output_file("out/{year}/report.md");
        let rendered = task.interpolated(&ctx()).unwrap();
        assert_eq!(rendered.description, "Research AI in healthcare");
        assert_eq!(rendered.expected_output, "Report for 2024");
        assert_eq!(rendered.output_file.as_deref(), Some("out/2024/report.md"));
        assert_eq!(rendered.id, task.id);
    }

    #[test]
    fn test_interpolated_lists_all_missing() {
        let task = Task::new("About {topic} for {audience}", "By {deadline}")
            .with_output_file("{audience}.md");
        let err = task.interpolated(&ctx()).unwrap_err();
        assert_eq!(err.missing, vec!["audience", "deadline"]);
    }

    #[test]
    fn test_label_and_summarize() {
        assert_eq!(Task::new("Short one", "x").label(), "Short one");
        assert_eq!(
            Task::new("one two three four five six seven eight nine", "x").label(),
            "one two three four five six seven eight..."
        );
        assert_eq!(Task::new("d", "x").with_name("research").label(), "research");
    }

    #[test]
    fn test_save_file_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report.md");
        let task = Task::new("d", "x").with_output_file(path.to_string_lossy());
        task.save_file("# Report").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Report");
    }

    #[test]
    fn test_save_file_without_path_is_noop() {
        Task::new("d", "x").save_file("ignored").unwrap();
    }

    #[test]
    fn test_deserialize_defaults() {
        let task: Task =
            serde_json::from_str(r#"{"description": "d", "expected_output": "e"}"#).unwrap();
        assert!(task.create_directory);
        assert!(task.agent.is_none());
        assert!(task.tools.is_none());
    }
}

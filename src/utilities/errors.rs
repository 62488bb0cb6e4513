//! Error types for crew execution.
//!
//! Validation errors (`ConfigurationError`, `MissingInputError`) are raised
//! before any agent turn begins. Per-task errors (`ToolInvocationError`,
//! `IterationLimitExceeded`, `LLMError`) surface as the failure of the task
//! that produced them. Everything a run can fail with is unified under
//! [`ExecutionError`] and reported through [`CrewError`], which also carries
//! the task outputs completed before the failure.

use thiserror::Error;

use crate::crews::execution::ExecutionState;
use crate::llms::base_llm::LLMError;
use crate::tasks::task_output::TaskOutput;

/// Invalid agent, task, or crew configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// An agent with the same role is already registered.
    #[error("an agent with role '{role}' is already registered")]
    DuplicateRole { role: String },

    /// No agent with the given role is registered.
    #[error("no agent with role '{role}' is registered")]
    UnknownAgent { role: String },

    /// A sequential task has no agent assigned.
    #[error(
        "task '{task}' has no agent assigned; sequential crews require every task to name an agent"
    )]
    UnassignedAgent { task: String },

    /// A hierarchical task pre-assigns an agent.
    #[error(
        "task '{task}' is pre-assigned to '{role}'; in a hierarchical crew the manager assigns every task"
    )]
    PreassignedAgent { task: String, role: String },

    /// An agent or task references a tool the crew does not provide.
    #[error("'{owner}' references unknown tool '{tool}'")]
    UnknownTool { owner: String, tool: String },

    /// An agent has no language model to drive its turns.
    #[error("agent '{role}' has no LLM configured")]
    MissingLlm { role: String },

    /// A hierarchical crew was started without a manager LLM.
    #[error("hierarchical process requires a manager LLM")]
    MissingManagerLlm,

    /// The crew has no tasks to run.
    #[error("crew has no tasks to run")]
    NoTasks,

    /// An agent was configured with a zero iteration budget.
    #[error("agent '{role}' must allow at least one iteration")]
    InvalidIterationBudget { role: String },
}

/// Run inputs do not cover every placeholder the crew references.
///
/// Always lists every unresolved placeholder, in order of first appearance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing input values for placeholders: {}", .missing.join(", "))]
pub struct MissingInputError {
    /// The unresolved placeholder names.
    pub missing: Vec<String>,
}

impl MissingInputError {
    pub fn new(missing: Vec<String>) -> Self {
        Self { missing }
    }
}

/// A tool failed while serving an agent's action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tool '{tool}' failed: {message}")]
pub struct ToolInvocationError {
    /// Name of the tool that failed.
    pub tool: String,
    /// Failure reported by the tool.
    pub message: String,
}

impl ToolInvocationError {
    pub fn new(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// An agent turn used its whole iteration budget without a final answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("agent '{role}' exceeded its iteration budget of {max_iter} without a final answer")]
pub struct IterationLimitExceeded {
    /// Role of the agent whose turn ran out.
    pub role: String,
    /// The configured budget.
    pub max_iter: u32,
}

/// The hierarchical manager could not hand a task to an eligible agent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("manager could not delegate task '{task}': {reason}")]
pub struct ManagerDelegationError {
    /// Summary of the task being dispatched.
    pub task: String,
    /// Why no delegation happened.
    pub reason: String,
}

/// Every way a crew run can fail.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Input(#[from] MissingInputError),

    #[error(transparent)]
    ToolInvocation(#[from] ToolInvocationError),

    #[error(transparent)]
    IterationLimit(#[from] IterationLimitExceeded),

    #[error(transparent)]
    ManagerDelegation(#[from] ManagerDelegationError),

    #[error("LLM call failed: {0}")]
    Llm(#[from] LLMError),

    /// Writing a task's output file failed.
    #[error("failed to write output file '{path}': {source}")]
    OutputFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecutionError {
    /// Whether the error was raised by validation, before any agent turn.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Input(_))
    }

    /// Whether the error came out of a single agent turn, which the
    /// hierarchical manager may reassign once.
    pub fn is_agent_turn_failure(&self) -> bool {
        matches!(
            self,
            Self::ToolInvocation(_) | Self::IterationLimit(_) | Self::Llm(_)
        )
    }
}

/// A failed crew run.
///
/// `completed` holds every task output produced before the failure so the
/// caller can inspect partial progress.
#[derive(Debug, Error)]
#[error("crew run failed after {} completed task(s): {source}", .completed.len())]
pub struct CrewError {
    /// The underlying failure.
    #[source]
    pub source: ExecutionError,
    /// Executor state at the time the error was reported.
    pub state: ExecutionState,
    /// Task outputs completed before the failure, in execution order.
    pub completed: Vec<TaskOutput>,
}

impl CrewError {
    pub fn new(source: ExecutionError, state: ExecutionState, completed: Vec<TaskOutput>) -> Self {
        Self {
            source,
            state,
            completed,
        }
    }
}

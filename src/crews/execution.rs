//! Crew execution.
//!
//! A [`CrewRun`] owns everything one run needs: the inputs, a run-local tool
//! cache, the state machine, the outputs produced so far and the token
//! usage. Validation happens while the run is still `Idle`, so a
//! configuration or input problem never reaches an agent turn.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentRegistry, TurnResources};
use crate::agents::cache::CacheHandler;
use crate::context::ExecutionContext;
use crate::crews::crew_output::CrewOutput;
use crate::crews::manager::{completed_context, Assignment, Briefing, FailedAttempt, Manager};
use crate::llms::base_llm::BaseLLM;
use crate::process::Process;
use crate::task::Task;
use crate::tasks::task_graph::TaskGraph;
use crate::tasks::task_output::TaskOutput;
use crate::tools::agent_tools::DelegateWorkToolSchema;
use crate::tools::tool_adapter::ToolAdapter;
use crate::types::usage_metrics::UsageMetrics;
use crate::utilities::errors::{
    ConfigurationError, CrewError, ExecutionError, ManagerDelegationError, MissingInputError,
};
use crate::utilities::prompts::{slices, task_with_context};
use crate::utilities::string_utils::missing_variables;

/// Called with each task output as soon as the task completes.
pub type TaskCallback = Arc<dyn Fn(&TaskOutput) + Send + Sync>;

/// Lifecycle of one crew run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl ExecutionState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: ExecutionState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// What a run executes. Borrowed from the [`Crew`](crate::crew::Crew) or
/// assembled by [`run`](crate::run).
#[derive(Clone)]
pub struct RunPlan<'a> {
    pub agents: &'a AgentRegistry,
    pub tasks: &'a TaskGraph,
    pub process: Process,
    pub tools: &'a ToolAdapter,
    pub manager_agent: Option<&'a Agent>,
    pub manager_llm: Option<Arc<dyn BaseLLM>>,
    pub verbose: bool,
    pub task_callback: Option<&'a TaskCallback>,
}

impl fmt::Debug for RunPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunPlan")
            .field("agents", &self.agents.roles())
            .field("tasks", &self.tasks.len())
            .field("process", &self.process)
            .field("manager_agent", &self.manager_agent.map(|a| a.role.as_str()))
            .field("verbose", &self.verbose)
            .finish()
    }
}

/// A validated plan: tasks rendered against the inputs, plus the manager
/// for hierarchical runs.
#[derive(Debug)]
pub struct PreparedRun {
    pub tasks: Vec<Task>,
    pub manager: Option<Manager>,
}

impl<'a> RunPlan<'a> {
    /// Check the plan against `context` without running any agent turn.
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::Configuration`] for an empty task list, bad task
    ///   assignments, unknown tools, agents without an LLM, or a missing
    ///   manager LLM.
    /// - [`ExecutionError::Input`] naming every placeholder the inputs do
    ///   not cover.
    /// - [`ExecutionError::ManagerDelegation`] when a hierarchical crew has no
    ///   delegation-eligible agent.
    pub fn validate(&self, context: &ExecutionContext) -> Result<PreparedRun, ExecutionError> {
        if self.tasks.is_empty() {
            return Err(ConfigurationError::NoTasks.into());
        }
        self.tasks.validate(self.agents, self.process)?;
        self.tasks.validate_tools(self.tools)?;
        for agent in self.agents.all() {
            if let Some(unknown) = agent.tools.iter().find(|t| !self.tools.contains(t)) {
                return Err(ConfigurationError::UnknownTool {
                    owner: agent.role.clone(),
                    tool: unknown.clone(),
                }
                .into());
            }
        }

        let manager = match self.process {
            Process::Sequential => {
                for task in self.tasks.tasks() {
                    let role = task.agent.as_deref().unwrap_or_default();
                    require_llm(self.agents.get(role)?)?;
                }
                None
            }
            Process::Hierarchical => {
                let manager_role = self
                    .manager_agent
                    .map_or(slices::MANAGER_ROLE, |custom| custom.role.as_str());
                if self.agents.contains(manager_role) {
                    return Err(ConfigurationError::DuplicateRole {
                        role: manager_role.to_string(),
                    }
                    .into());
                }
                for agent in self.agents.delegation_eligible() {
                    require_llm(agent)?;
                }
                Some(Manager::resolve(self.manager_agent, self.manager_llm.clone())?)
            }
        };

        let templates = self
            .tasks
            .tasks()
            .iter()
            .flat_map(Task::templates)
            .chain(self.agents.all().flat_map(Agent::templates))
            .chain(manager.iter().flat_map(|m| m.agent().templates()));
        let missing = missing_variables(templates, &context.inputs);
        if !missing.is_empty() {
            return Err(MissingInputError::new(missing).into());
        }

        if manager.is_some() && self.agents.delegation_eligible().next().is_none() {
            return Err(ManagerDelegationError {
                task: self.tasks.tasks()[0].label(),
                reason: "no registered agent allows delegation".to_string(),
            }
            .into());
        }

        Ok(PreparedRun {
            tasks: self.tasks.render_all(context)?,
            manager,
        })
    }
}

fn require_llm(agent: &Agent) -> Result<(), ConfigurationError> {
    if agent.llm.is_none() {
        return Err(ConfigurationError::MissingLlm {
            role: agent.role.clone(),
        });
    }
    Ok(())
}

/// One execution of a plan.
pub struct CrewRun<'a> {
    plan: RunPlan<'a>,
    context: ExecutionContext,
    cache: CacheHandler,
    state: ExecutionState,
    outputs: Vec<TaskOutput>,
    usage: UsageMetrics,
}

impl<'a> CrewRun<'a> {
    pub fn new(plan: RunPlan<'a>, context: ExecutionContext) -> Self {
        Self {
            plan,
            context,
            cache: CacheHandler::new(),
            state: ExecutionState::Idle,
            outputs: Vec::new(),
            usage: UsageMetrics::default(),
        }
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Move to `next`; an illegal transition is refused and logged.
    fn transition(&mut self, next: ExecutionState) -> bool {
        if !self.state.can_transition_to(next) {
            log::error!("Refusing crew state transition {} -> {}", self.state, next);
            return false;
        }
        log::debug!("Crew state {} -> {}", self.state, next);
        self.state = next;
        true
    }

    /// Validate, then run every task to completion or first failure.
    ///
    /// # Errors
    ///
    /// A [`CrewError`] carrying the failure, the state the run ended in
    /// (`Idle` when validation failed, `Failed` otherwise) and every task
    /// output completed before the failure.
    pub async fn execute(mut self) -> Result<CrewOutput, CrewError> {
        let prepared = match self.plan.validate(&self.context) {
            Ok(prepared) => prepared,
            Err(e) => {
                log::error!("Crew validation failed: {}", e);
                return Err(CrewError::new(e, self.state, Vec::new()));
            }
        };

        self.transition(ExecutionState::Running);
        log::info!(
            "Crew run started: process={}, tasks={}",
            self.plan.process,
            prepared.tasks.len()
        );

        let result = match &prepared.manager {
            None => self.run_sequential(&prepared.tasks).await,
            Some(manager) => self.run_hierarchical(&prepared.tasks, manager).await,
        };

        match result {
            Ok(()) => {
                self.transition(ExecutionState::Completed);
                log::info!(
                    "Crew run completed: {} task(s), {} tokens",
                    self.outputs.len(),
                    self.usage.total_tokens
                );
                Ok(CrewOutput::new(self.outputs, self.usage))
            }
            Err(e) => {
                self.transition(ExecutionState::Failed);
                log::error!(
                    "Crew run failed after {} completed task(s): {}",
                    self.outputs.len(),
                    e
                );
                Err(CrewError::new(e, self.state, self.outputs))
            }
        }
    }

    async fn run_sequential(&mut self, tasks: &[Task]) -> Result<(), ExecutionError> {
        let agents = self.plan.agents;
        for task in tasks {
            let role = task
                .agent
                .as_deref()
                .ok_or_else(|| ConfigurationError::UnassignedAgent { task: task.label() })?;
            let agent = agents.get(role)?;
            let tools = task.tools.clone().unwrap_or_else(|| agent.tools.clone());
            let prompt = task_with_context(&task.prompt(), &completed_context(&self.outputs));

            log::info!("Task '{}' started by '{}'", task.label(), agent.role);
            let resources = TurnResources {
                context: &self.context,
                tools: self.plan.tools,
                cache: &self.cache,
                verbose: self.plan.verbose,
            };
            let turn = agent
                .execute_task(&prompt, &tools, resources, &mut self.usage)
                .await?;

            self.finish_task(task, TaskOutput::new(task, &agent.role, turn.output))?;
        }
        Ok(())
    }

    async fn run_hierarchical(
        &mut self,
        tasks: &[Task],
        manager: &Manager,
    ) -> Result<(), ExecutionError> {
        let agents = self.plan.agents;
        let verbose = self.plan.verbose;
        let eligible: Vec<&Agent> = agents.delegation_eligible().collect();

        for (position, task) in tasks.iter().enumerate() {
            let mut coworkers = eligible.clone();
            let mut failure: Option<(String, ExecutionError)> = None;
            let mut attempts = 0;

            let output = loop {
                let briefing = Briefing {
                    plan: tasks,
                    position,
                    completed: &self.outputs,
                    coworkers: &coworkers,
                    failed: failure
                        .as_ref()
                        .map(|(role, error)| FailedAttempt { role, error }),
                };
                let assignment = manager
                    .assign(briefing, &self.context, verbose, &mut self.usage)
                    .await?;
                attempts += 1;

                let (coworker, instructions) = match assignment {
                    Assignment::Answer(answer) => {
                        break TaskOutput::new(task, manager.role(), answer).with_attempts(attempts);
                    }
                    Assignment::Delegate {
                        coworker,
                        instructions,
                    } => (coworker, instructions),
                };

                let agent = agents.get(&coworker)?;
                let tools = task.tools.clone().unwrap_or_else(|| agent.tools.clone());
                let prompt = delegated_prompt(task, &instructions, &self.outputs);

                log::info!(
                    "Task '{}' delegated to '{}' (attempt {})",
                    task.label(),
                    agent.role,
                    attempts
                );
                let resources = TurnResources {
                    context: &self.context,
                    tools: self.plan.tools,
                    cache: &self.cache,
                    verbose,
                };
                match agent
                    .execute_task(&prompt, &tools, resources, &mut self.usage)
                    .await
                {
                    Ok(turn) => {
                        break TaskOutput::new(task, &agent.role, turn.output)
                            .with_delegated_by(manager.role())
                            .with_attempts(attempts);
                    }
                    Err(e) if e.is_agent_turn_failure() && failure.is_none() => {
                        log::warn!(
                            "'{}' failed task '{}': {}; asking the manager to reassign",
                            agent.role,
                            task.label(),
                            e
                        );
                        if coworkers.len() > 1 {
                            coworkers.retain(|a| a.role != agent.role);
                        }
                        failure = Some((agent.role.clone(), e));
                    }
                    Err(e) => return Err(e),
                }
            };

            self.finish_task(task, output)?;
        }
        Ok(())
    }

    /// Persist, report and record a completed task.
    ///
    /// The output is recorded even when writing its file fails, so the
    /// error still carries it as completed work.
    fn finish_task(&mut self, task: &Task, output: TaskOutput) -> Result<(), ExecutionError> {
        let saved = task.save_file(&output.raw);
        log::info!("Task '{}' completed by '{}'", task.label(), output.agent);
        if let Some(callback) = self.plan.task_callback {
            callback(&output);
        }
        self.outputs.push(output);
        saved
    }
}

/// Worker prompt for a delegated task: the task itself, the manager's
/// instructions, and the completed outputs plus the manager's context.
fn delegated_prompt(
    task: &Task,
    instructions: &DelegateWorkToolSchema,
    completed: &[TaskOutput],
) -> String {
    let mut prompt = task.prompt();
    if !instructions.task.trim().is_empty() {
        prompt.push_str("\n\nInstructions from your manager: ");
        prompt.push_str(instructions.task.trim());
    }

    let mut context = completed_context(completed);
    if !instructions.context.trim().is_empty() {
        if !context.is_empty() {
            context.push_str("\n\n---\n\n");
        }
        context.push_str(instructions.context.trim());
    }
    task_with_context(&prompt, &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingTool, ScriptedLLM};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn final_answer(text: &str) -> String {
        format!("Thought: I now know the final answer\nFinal Answer: {}", text)
    }

    fn plan<'a>(
        agents: &'a AgentRegistry,
        tasks: &'a TaskGraph,
        tools: &'a ToolAdapter,
    ) -> RunPlan<'a> {
        RunPlan {
            agents,
            tasks,
            process: Process::Sequential,
            tools,
            manager_agent: None,
            manager_llm: None,
            verbose: false,
            task_callback: None,
        }
    }

    #[test]
    fn test_state_transitions() {
        use ExecutionState::*;
        assert!(Idle.can_transition_to(Running));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Failed));
        assert!(!Idle.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Running));
        assert!(!Failed.can_transition_to(Running));
        assert!(Failed.is_terminal() && Completed.is_terminal());
        assert!(!Running.is_terminal());
        assert_eq!(Failed.to_string(), "failed");
    }

    #[test]
    fn test_illegal_transition_is_refused() {
        let agents = AgentRegistry::new();
        let tasks = TaskGraph::new();
        let tools = ToolAdapter::new();
        let mut run = CrewRun::new(plan(&agents, &tasks, &tools), ExecutionContext::default());
        assert!(!run.transition(ExecutionState::Completed));
        assert_eq!(run.state(), ExecutionState::Idle);
        assert!(run.transition(ExecutionState::Running));
        assert!(run.transition(ExecutionState::Failed));
        assert!(!run.transition(ExecutionState::Running));
        assert_eq!(run.state(), ExecutionState::Failed);
    }

    #[tokio::test]
    async fn test_sequential_passes_previous_outputs_as_context() {
        let llm = ScriptedLLM::new([final_answer("venue list"), final_answer("final plan")]);
        let agents = AgentRegistry::new()
            .with_agent(Agent::new("Finder", "Find", "Scout").with_llm(llm.clone()))
            .unwrap();
        let tasks = TaskGraph::new()
            .with_task(Task::new("Find venues", "List").with_agent("Finder"))
            .with_task(Task::new("Pick one", "Plan").with_agent("finder"));
        let tools = ToolAdapter::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let callback: TaskCallback = Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let mut plan = plan(&agents, &tasks, &tools);
        plan.task_callback = Some(&callback);

        let output = CrewRun::new(plan, ExecutionContext::default())
            .execute()
            .await
            .unwrap();

        assert_eq!(output.len(), 2);
        assert_eq!(output.finalize(), "final plan");
        assert_eq!(output.token_usage.successful_requests, 2);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert!(llm.prompts()[1].contains("venue list"));
        assert!(!llm.prompts()[0].contains("This is the context"));
    }

    #[tokio::test]
    async fn test_validation_failure_stays_idle() {
        let llm = ScriptedLLM::new([final_answer("x")]);
        let agents = AgentRegistry::new()
            .with_agent(Agent::new("Finder", "Find", "Scout").with_llm(llm.clone()))
            .unwrap();
        let tasks = TaskGraph::new().with_task(Task::new("About {topic}", "x").with_agent("Finder"));
        let tools = ToolAdapter::new();

        let err = CrewRun::new(plan(&agents, &tasks, &tools), ExecutionContext::default())
            .execute()
            .await
            .unwrap_err();
        assert!(err.source.is_validation());
        assert_eq!(err.state, ExecutionState::Idle);
        assert_eq!(llm.calls(), 0);
    }

    #[test]
    fn test_validate_rejects_empty_and_unknown_agent_tools() {
        let agents = AgentRegistry::new()
            .with_agent(Agent::new("Finder", "Find", "Scout").with_tools(["search"]))
            .unwrap();
        let empty = TaskGraph::new();
        let tools = ToolAdapter::new();
        assert!(matches!(
            plan(&agents, &empty, &tools).validate(&ExecutionContext::default()),
            Err(ExecutionError::Configuration(ConfigurationError::NoTasks))
        ));

        let tasks = TaskGraph::new().with_task(Task::new("Find", "x").with_agent("Finder"));
        assert!(matches!(
            plan(&agents, &tasks, &tools).validate(&ExecutionContext::default()),
            Err(ExecutionError::Configuration(ConfigurationError::UnknownTool { owner, .. })) if owner == "Finder"
        ));

        let tools = ToolAdapter::new().with_tool(CountingTool::new("search", "ok"));
        assert!(matches!(
            plan(&agents, &tasks, &tools).validate(&ExecutionContext::default()),
            Err(ExecutionError::Configuration(ConfigurationError::MissingLlm { role })) if role == "Finder"
        ));
    }

    #[test]
    fn test_hierarchical_validation() {
        let llm = ScriptedLLM::new(Vec::<String>::new());
        let agents = AgentRegistry::new()
            .with_agent(Agent::new("Writer", "Write", "Writes").with_llm(llm.clone()))
            .unwrap();
        let tasks = TaskGraph::new().with_task(Task::new("Write", "x"));
        let tools = ToolAdapter::new();
        let writer = Agent::new("Writer", "Write", "Writes").with_llm(llm.clone());
        let mut plan = plan(&agents, &tasks, &tools);
        plan.process = Process::Hierarchical;

        assert!(matches!(
            plan.validate(&ExecutionContext::default()),
            Err(ExecutionError::Configuration(ConfigurationError::MissingManagerLlm))
        ));

        plan.manager_llm = Some(llm.clone() as Arc<dyn BaseLLM>);
        assert!(matches!(
            plan.validate(&ExecutionContext::default()),
            Err(ExecutionError::ManagerDelegation(_))
        ));

        plan.manager_agent = Some(&writer);
        assert!(matches!(
            plan.validate(&ExecutionContext::default()),
            Err(ExecutionError::Configuration(ConfigurationError::DuplicateRole { .. }))
        ));
    }

    #[test]
    fn test_worker_cannot_take_the_default_manager_role() {
        let llm = ScriptedLLM::new(Vec::<String>::new());
        let agents = AgentRegistry::new()
            .with_agent(
                Agent::new(" crew  manager", "Write", "Writes")
                    .with_allow_delegation(true)
                    .with_llm(llm.clone()),
            )
            .unwrap();
        let tasks = TaskGraph::new().with_task(Task::new("Write", "x"));
        let tools = ToolAdapter::new();
        let mut plan = plan(&agents, &tasks, &tools);
        plan.process = Process::Hierarchical;
        plan.manager_llm = Some(llm as Arc<dyn BaseLLM>);

        assert!(matches!(
            plan.validate(&ExecutionContext::default()),
            Err(ExecutionError::Configuration(ConfigurationError::DuplicateRole { role }))
                if role == slices::MANAGER_ROLE
        ));
    }

    #[test]
    fn test_delegated_prompt() {
        let task = Task::new("Write the report", "A report");
        let instructions = DelegateWorkToolSchema {
            task: "Focus on costs".into(),
            context: "Budget is tight".into(),
            coworker: "Writer".into(),
        };
        let done = vec![TaskOutput::new(&Task::new("Research", "Notes"), "R", "the notes")];
        let prompt = delegated_prompt(&task, &instructions, &done);
        assert!(prompt.starts_with("Write the report"));
        assert!(prompt.contains("Instructions from your manager: Focus on costs"));
        assert!(prompt.contains("the notes\n\n---\n\nBudget is tight"));
    }
}

//! Main Crew struct.
//!
//! A crew bundles a shared agent registry, the ordered tasks, a process and
//! the tools its agents may call. `kickoff` borrows the crew immutably:
//! every run owns its own inputs, tool cache, state and outputs, so one crew
//! (or one registry) can serve several runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::agent::{Agent, AgentRegistry};
use crate::context::ExecutionContext;
use crate::crews::crew_output::CrewOutput;
use crate::crews::execution::{CrewRun, PreparedRun, RunPlan, TaskCallback};
use crate::llms::base_llm::BaseLLM;
use crate::process::Process;
use crate::task::Task;
use crate::tasks::task_graph::TaskGraph;
use crate::tasks::task_output::TaskOutput;
use crate::tools::tool_adapter::ToolAdapter;
use crate::utilities::errors::{CrewError, ExecutionError};

/// Represents a group of agents, defining how they should collaborate and the
/// tasks they should perform.
#[derive(Clone)]
pub struct Crew {
    /// Optional name for the crew.
    pub name: Option<String>,
    /// Unique identifier for the crew instance.
    pub id: Uuid,
    /// Registered agents. Shared, never mutated by a run.
    pub agents: Arc<AgentRegistry>,
    /// Tasks in execution order.
    pub tasks: TaskGraph,
    /// The process flow that the crew will follow.
    pub process: Process,
    /// Tools the agents may reference by name.
    pub tools: Arc<ToolAdapter>,
    /// Language model that will run the manager agent.
    pub manager_llm: Option<Arc<dyn BaseLLM>>,
    /// Custom manager agent for hierarchical crews.
    pub manager_agent: Option<Agent>,
    /// Echo agent steps to stdout.
    pub verbose: bool,
    /// Callback to be executed after each task.
    pub task_callback: Option<TaskCallback>,
}

impl fmt::Debug for Crew {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crew")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("process", &self.process)
            .field("agents", &self.agents.roles())
            .field("tasks", &self.tasks.len())
            .field("tools", &self.tools.names().collect::<Vec<_>>())
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl Crew {
    /// Create a sequential crew with no tools.
    pub fn new(agents: impl Into<Arc<AgentRegistry>>, tasks: TaskGraph) -> Self {
        Self {
            name: None,
            id: Uuid::new_v4(),
            agents: agents.into(),
            tasks,
            process: Process::Sequential,
            tools: Arc::new(ToolAdapter::new()),
            manager_llm: None,
            manager_agent: None,
            verbose: false,
            task_callback: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    pub fn with_tools(mut self, tools: impl Into<Arc<ToolAdapter>>) -> Self {
        self.tools = tools.into();
        self
    }

    pub fn with_manager_llm(mut self, llm: Arc<dyn BaseLLM>) -> Self {
        self.manager_llm = Some(llm);
        self
    }

    /// Builder: replace the default "Crew Manager" persona.
    pub fn with_manager_agent(mut self, agent: Agent) -> Self {
        self.manager_agent = Some(agent);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builder: call `callback` with each task output as it completes.
    pub fn with_task_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TaskOutput) + Send + Sync + 'static,
    {
        self.task_callback = Some(Arc::new(callback));
        self
    }

    fn plan(&self) -> RunPlan<'_> {
        RunPlan {
            agents: &self.agents,
            tasks: &self.tasks,
            process: self.process,
            tools: &self.tools,
            manager_agent: self.manager_agent.as_ref(),
            manager_llm: self.manager_llm.clone(),
            verbose: self.verbose,
            task_callback: self.task_callback.as_ref(),
        }
    }

    /// Run configuration and input validation only.
    ///
    /// Returns the tasks rendered against `inputs`.
    pub fn validate(&self, inputs: &HashMap<String, String>) -> Result<Vec<Task>, ExecutionError> {
        let context = ExecutionContext::new(inputs.clone());
        let PreparedRun { tasks, .. } = self.plan().validate(&context)?;
        Ok(tasks)
    }

    /// Execute the crew's workflow.
    ///
    /// # Errors
    ///
    /// A [`CrewError`] with the failure and every task output completed
    /// before it. Validation failures are reported before any agent turn.
    pub async fn kickoff(&self, inputs: HashMap<String, String>) -> Result<CrewOutput, CrewError> {
        log::info!(
            "Crew {} kickoff: process={}, agents={}, tasks={}",
            self.name.as_deref().unwrap_or("crew"),
            self.process,
            self.agents.len(),
            self.tasks.len()
        );
        CrewRun::new(self.plan(), ExecutionContext::new(inputs))
            .execute()
            .await
    }
}

impl fmt::Display for Crew {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Crew(id={}, process={}, number_of_agents={}, number_of_tasks={})",
            self.id,
            self.process,
            self.agents.len(),
            self.tasks.len()
        )
    }
}

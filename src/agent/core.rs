//! Core Agent struct.
//!
//! An agent is a persona (role, goal, backstory) plus the tools it may use,
//! whether the hierarchical manager may hand it work, and its per-turn
//! iteration budget. Agents are immutable once registered; goal and backstory
//! placeholders are rendered from the run inputs each time a turn starts.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::agents::cache::CacheHandler;
use crate::agents::crew_agent_executor::CrewAgentExecutor;
use crate::context::ExecutionContext;
use crate::llms::base_llm::BaseLLM;
use crate::tools::tool_adapter::ToolAdapter;
use crate::types::usage_metrics::UsageMetrics;
use crate::utilities::errors::{ConfigurationError, ExecutionError, MissingInputError};
use crate::utilities::prompts::AgentInfo;

/// Default iteration budget for one agent turn.
pub const DEFAULT_MAX_ITER: u32 = 25;

/// Represents an agent in a crew.
#[derive(Clone)]
pub struct Agent {
    /// Unique identifier for the agent.
    pub id: Uuid,
    /// Role of the agent. Unique within a registry.
    pub role: String,
    /// Objective of the agent. May contain `{placeholders}`.
    pub goal: String,
    /// Backstory of the agent. May contain `{placeholders}`.
    pub backstory: String,
    /// ToolRefs at the agent's disposal.
    pub tools: Vec<String>,
    /// Whether the hierarchical manager may delegate work to this agent.
    pub allow_delegation: bool,
    /// Maximum LLM calls in one turn.
    pub max_iter: u32,
    /// Echo turn steps to stdout.
    pub verbose: bool,
    /// Serve repeated identical tool calls from the run's cache.
    pub cache: bool,
    /// Language model that drives the agent.
    pub llm: Option<Arc<dyn BaseLLM>>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("goal", &self.goal)
            .field("tools", &self.tools)
            .field("allow_delegation", &self.allow_delegation)
            .field("max_iter", &self.max_iter)
            .field("llm", &self.llm.as_ref().map(|l| l.model().to_string()))
            .finish()
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent(role={}, goal={})", self.role, self.goal)
    }
}

/// Everything a turn borrows from the run that hosts it.
#[derive(Debug, Clone, Copy)]
pub struct TurnResources<'a> {
    /// Run inputs for goal/backstory placeholders.
    pub context: &'a ExecutionContext,
    /// Tool Invocation Adapter.
    pub tools: &'a ToolAdapter,
    /// Run-local tool cache.
    pub cache: &'a CacheHandler,
    /// Crew-level verbose flag; an agent's own flag also enables output.
    pub verbose: bool,
}

/// Successful result of one agent turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTurnOutput {
    /// The final answer.
    pub output: String,
    /// LLM calls used.
    pub iterations: u32,
}

impl Agent {
    /// Create a new Agent with required fields.
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            tools: Vec::new(),
            allow_delegation: false,
            max_iter: DEFAULT_MAX_ITER,
            verbose: false,
            cache: true,
            llm: None,
        }
    }

    /// Builder: replace the agent's tools.
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: allow the manager to delegate to this agent.
    pub fn with_allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    /// Builder: set the per-turn iteration budget.
    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Builder: set the language model.
    pub fn with_llm(mut self, llm: Arc<dyn BaseLLM>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Builder: set verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builder: enable or disable the tool cache for this agent.
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Templates that may reference run inputs.
    pub fn templates(&self) -> [&str; 2] {
        [&self.goal, &self.backstory]
    }

    /// Goal and backstory rendered against `context`.
    pub fn interpolated(
        &self,
        context: &ExecutionContext,
    ) -> Result<(String, String), MissingInputError> {
        Ok((
            context.interpolate(&self.goal)?,
            context.interpolate(&self.backstory)?,
        ))
    }

    /// Run one turn on `task_prompt` using the ToolRefs in `tools`.
    ///
    /// Token usage is added to `usage` whether or not the turn succeeds.
    ///
    /// # Errors
    ///
    /// Fails with the turn's first error: an exhausted iteration budget, a
    /// tool failure, or an LLM failure. A missing LLM is a configuration
    /// error; crews reject it during validation.
    pub async fn execute_task(
        &self,
        task_prompt: &str,
        tools: &[String],
        resources: TurnResources<'_>,
        usage: &mut UsageMetrics,
    ) -> Result<AgentTurnOutput, ExecutionError> {
        let llm = self.llm.clone().ok_or_else(|| ConfigurationError::MissingLlm {
            role: self.role.clone(),
        })?;
        let (goal, backstory) = self.interpolated(resources.context)?;

        log::debug!(
            "Agent '{}' starting turn with {} tool(s), max_iter={}",
            self.role,
            tools.len(),
            self.max_iter
        );

        let info = AgentInfo {
            role: &self.role,
            goal: &goal,
            backstory: &backstory,
        };
        let mut executor = CrewAgentExecutor::new(
            llm,
            info,
            task_prompt,
            tools.to_vec(),
            resources.tools,
            self.max_iter,
        )
        .with_verbose(self.verbose || resources.verbose);
        if self.cache {
            executor = executor.with_cache(resources.cache);
        }

        let result = executor.invoke().await;
        usage.add_usage_metrics(&executor.usage());
        let finish = result?;

        Ok(AgentTurnOutput {
            output: finish.output,
            iterations: executor.iterations(),
        })
    }
}

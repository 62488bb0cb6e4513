//! Agent executor.
//!
//! Drives one agent turn: a ReAct loop of LLM calls, tool actions and
//! observations that ends in a final answer or in a failure. Every LLM call
//! consumes one iteration of the agent's budget.

use std::fmt;
use std::sync::Arc;

use super::cache::CacheHandler;
use super::parser::{parse, AgentAction, AgentFinish, ParseResult};
use crate::llms::base_llm::{apply_stop_words, BaseLLM, LLMMessage};
use crate::tools::tool_adapter::ToolAdapter;
use crate::types::usage_metrics::UsageMetrics;
use crate::utilities::errors::{ExecutionError, IterationLimitExceeded};
use crate::utilities::printer::{Printer, PrinterColor};
use crate::utilities::prompts::{AgentInfo, Prompts};

/// Stop words that end a model response before it invents an observation.
pub const DEFAULT_STOP_WORDS: &[&str] = &["\nObservation:"];

/// Executor for one agent turn.
pub struct CrewAgentExecutor<'a> {
    /// The language model driving the turn.
    llm: Arc<dyn BaseLLM>,
    /// Role of the agent, for logs and errors.
    role: String,
    /// Conversation so far.
    messages: Vec<LLMMessage>,
    /// Prompt builder holding the turn's tool set.
    prompts: Prompts,
    /// Stop word list for the LLM.
    stop: Vec<String>,
    /// Maximum LLM calls for the turn.
    max_iter: u32,
    /// LLM calls made so far.
    iterations: u32,
    /// Tool Invocation Adapter.
    tools: &'a ToolAdapter,
    /// Run-local tool cache.
    cache: Option<&'a CacheHandler>,
    /// Token usage across the turn's LLM calls.
    usage: UsageMetrics,
    verbose: bool,
    printer: Printer,
}

impl fmt::Debug for CrewAgentExecutor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrewAgentExecutor")
            .field("role", &self.role)
            .field("model", &self.llm.model())
            .field("tools", &self.prompts.tool_names)
            .field("max_iter", &self.max_iter)
            .field("iterations", &self.iterations)
            .finish()
    }
}

impl<'a> CrewAgentExecutor<'a> {
    /// Create an executor for `agent` working on `task_input` with the
    /// given tool names.
    pub fn new(
        llm: Arc<dyn BaseLLM>,
        agent: AgentInfo<'_>,
        task_input: &str,
        tool_names: Vec<String>,
        tools: &'a ToolAdapter,
        max_iter: u32,
    ) -> Self {
        let prompts = Prompts::new(tools.describe(&tool_names), tool_names);
        Self::with_prompts(llm, agent, task_input, prompts, tools, max_iter)
    }

    /// Create an executor with a prebuilt tool section, for actions that
    /// are not served by the adapter.
    pub fn with_prompts(
        llm: Arc<dyn BaseLLM>,
        agent: AgentInfo<'_>,
        task_input: &str,
        prompts: Prompts,
        tools: &'a ToolAdapter,
        max_iter: u32,
    ) -> Self {
        let prompt = prompts.task_execution(agent, task_input);
        Self {
            llm,
            role: agent.role.to_string(),
            messages: vec![LLMMessage::system(prompt.system), LLMMessage::user(prompt.user)],
            prompts,
            stop: DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
            max_iter,
            iterations: 0,
            tools,
            cache: None,
            usage: UsageMetrics::default(),
            verbose: false,
            printer: Printer::new(),
        }
    }

    /// Prompt builder for this turn.
    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    /// Builder: serve repeated tool calls from `cache`.
    pub fn with_cache(mut self, cache: &'a CacheHandler) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Builder: echo steps to stdout.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// LLM calls made so far.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Token usage accumulated so far.
    pub fn usage(&self) -> UsageMetrics {
        self.usage
    }

    /// The conversation so far.
    pub fn messages(&self) -> &[LLMMessage] {
        &self.messages
    }

    /// Append an observation for the last action.
    pub fn observe(&mut self, observation: &str) {
        if self.verbose {
            self.printer
                .print_labeled("## Tool Output:", observation, PrinterColor::Green);
        }
        self.messages
            .push(LLMMessage::user(format!("Observation: {}", observation)));
    }

    /// Run the turn to its final answer.
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::IterationLimit`] when the budget runs out.
    /// - [`ExecutionError::ToolInvocation`] on the first failing tool call.
    /// - [`ExecutionError::Llm`] when the model call fails.
    pub async fn invoke(&mut self) -> Result<AgentFinish, ExecutionError> {
        if self.verbose {
            self.printer
                .print_labeled("# Agent:", &self.role, PrinterColor::BoldPurple);
        }

        loop {
            match self.next_step().await? {
                ParseResult::Finish(finish) => {
                    log::debug!(
                        "Agent '{}' finished after {} iteration(s)",
                        self.role,
                        self.iterations
                    );
                    if self.verbose {
                        self.printer
                            .print_labeled("## Final Answer:", &finish.output, PrinterColor::Green);
                    }
                    return Ok(finish);
                }
                ParseResult::Action(action) => {
                    let observation = self.execute_action(&action).await?;
                    self.observe(&observation);
                }
            }
        }
    }

    /// Ask the model for its next step.
    ///
    /// Unparsable responses are fed back as observations and the model is
    /// asked again; each attempt consumes an iteration.
    ///
    /// # Errors
    ///
    /// [`ExecutionError::IterationLimit`] when the budget is exhausted, or
    /// [`ExecutionError::Llm`] when the call fails.
    pub async fn next_step(&mut self) -> Result<ParseResult, ExecutionError> {
        loop {
            if self.iterations >= self.max_iter {
                log::warn!(
                    "Agent '{}' reached its iteration budget of {}",
                    self.role,
                    self.max_iter
                );
                return Err(IterationLimitExceeded {
                    role: self.role.clone(),
                    max_iter: self.max_iter,
                }
                .into());
            }
            self.iterations += 1;

            let response = self.llm.call(&self.messages, &self.stop).await?;
            self.usage.add_usage_metrics(&response.usage);
            // Providers without server-side stop support may run past it.
            let text = if self.llm.supports_stop_words() {
                response.content.trim().to_string()
            } else {
                apply_stop_words(&response.content, &self.stop).trim().to_string()
            };
            self.messages.push(LLMMessage::assistant(text.clone()));

            match parse(&text) {
                Ok(result) => {
                    if let ParseResult::Action(action) = &result {
                        self.print_action(action);
                    }
                    return Ok(result);
                }
                Err(e) => {
                    log::debug!(
                        "Agent '{}' produced unparsable output (iteration {}): {}",
                        self.role,
                        self.iterations,
                        e
                    );
                    self.observe(&e.error);
                }
            }
        }
    }

    /// Execute a tool action and return the observation text.
    async fn execute_action(&self, action: &AgentAction) -> Result<String, ExecutionError> {
        if !self.prompts.tool_names.iter().any(|t| t == &action.tool) {
            log::debug!("Agent '{}' asked for unknown tool '{}'", self.role, action.tool);
            return Ok(self.prompts.tool_not_found(&action.tool));
        }

        if let Some(cached) = self.cache.and_then(|c| c.read(&action.tool, &action.tool_input)) {
            log::debug!("Serving '{}' from the tool cache", action.tool);
            return Ok(cached);
        }

        let output = self.tools.invoke(&action.tool, &action.tool_input).await?;
        if let (Some(cache), Some(tool)) = (self.cache, self.tools.get(&action.tool)) {
            if tool.should_cache(&action.tool_input, &output) {
                cache.add(&action.tool, &action.tool_input, output.clone());
            }
        }
        Ok(output)
    }

    fn print_action(&self, action: &AgentAction) {
        log::debug!(
            "Agent '{}' uses tool '{}' with input: {}",
            self.role,
            action.tool,
            action.tool_input
        );
        if self.verbose {
            if !action.thought.is_empty() {
                self.printer
                    .print_labeled("## Thought:", &action.thought, PrinterColor::BoldGreen);
            }
            self.printer
                .print_labeled("## Using tool:", &action.tool, PrinterColor::BoldGreen);
            self.printer
                .print_labeled("## Tool Input:", &action.tool_input, PrinterColor::BoldGreen);
        }
    }
}

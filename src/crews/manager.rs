//! Hierarchical manager.
//!
//! The manager is an LLM-driven agent whose only action is
//! `Delegate work to coworker`. For each task it is shown the crew plan, the
//! work completed so far and the roster of delegation-eligible coworkers, and
//! it answers with exactly one delegation. Unknown or ineligible coworkers
//! and malformed delegation inputs are fed back as observations and cost the
//! manager an iteration. A `Final Answer` from the manager completes the task
//! without a worker turn.

use std::sync::Arc;

use crate::agent::Agent;
use crate::agents::crew_agent_executor::CrewAgentExecutor;
use crate::agents::parser::ParseResult;
use crate::context::ExecutionContext;
use crate::llms::base_llm::BaseLLM;
use crate::task::Task;
use crate::tasks::task_output::TaskOutput;
use crate::tools::agent_tools::{DelegateWorkTool, DelegateWorkToolSchema, DELEGATE_WORK_TOOL_NAME};
use crate::tools::tool_adapter::ToolAdapter;
use crate::types::usage_metrics::UsageMetrics;
use crate::utilities::errors::{ConfigurationError, ExecutionError, ManagerDelegationError};
use crate::utilities::prompts::{slices, task_with_context, AgentInfo, Prompts};

/// What the manager decided for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// Hand the task to `coworker` (a registered role).
    Delegate {
        coworker: String,
        instructions: DelegateWorkToolSchema,
    },
    /// The manager answered the task itself.
    Answer(String),
}

/// A failed worker turn the manager is told about when reassigning.
#[derive(Debug, Clone, Copy)]
pub struct FailedAttempt<'a> {
    pub role: &'a str,
    pub error: &'a ExecutionError,
}

/// What the manager sees when assigning one task.
#[derive(Debug, Clone, Copy)]
pub struct Briefing<'a> {
    /// Every rendered task in execution order.
    pub plan: &'a [Task],
    /// Index of the task being assigned.
    pub position: usize,
    /// Outputs of the tasks before `position`.
    pub completed: &'a [TaskOutput],
    /// Agents the manager may pick.
    pub coworkers: &'a [&'a Agent],
    /// Previous attempt on this task, when reassigning.
    pub failed: Option<FailedAttempt<'a>>,
}

/// The hierarchical crew manager.
#[derive(Debug, Clone)]
pub struct Manager {
    agent: Agent,
    llm: Arc<dyn BaseLLM>,
}

impl Manager {
    /// Build the manager from an optional custom agent and the crew's
    /// manager LLM. A custom manager keeps its own LLM when it has one.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::MissingManagerLlm`] when neither provides a
    /// language model.
    pub fn resolve(
        custom: Option<&Agent>,
        manager_llm: Option<Arc<dyn BaseLLM>>,
    ) -> Result<Self, ConfigurationError> {
        let agent = match custom {
            Some(agent) => agent.clone(),
            None => Agent::new(
                slices::MANAGER_ROLE,
                slices::MANAGER_GOAL,
                slices::MANAGER_BACKSTORY,
            ),
        };
        let llm = agent
            .llm
            .clone()
            .or(manager_llm)
            .ok_or(ConfigurationError::MissingManagerLlm)?;
        log::debug!("Using manager '{}' with model {}", agent.role, llm.model());
        Ok(Self { agent, llm })
    }

    pub fn role(&self) -> &str {
        &self.agent.role
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Ask the manager who should handle `briefing.plan[briefing.position]`.
    ///
    /// Token usage is added to `usage` whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::ManagerDelegation`] when the manager spends its
    ///   iteration budget without a valid delegation.
    /// - [`ExecutionError::Llm`] when the manager's model call fails.
    pub async fn assign(
        &self,
        briefing: Briefing<'_>,
        context: &ExecutionContext,
        verbose: bool,
        usage: &mut UsageMetrics,
    ) -> Result<Assignment, ExecutionError> {
        let task = &briefing.plan[briefing.position];
        let (goal, backstory) = self.agent.interpolated(context)?;
        let delegate = DelegateWorkTool::new(
            briefing.coworkers.iter().map(|a| a.role.clone()).collect(),
        );
        let prompts = Prompts::new(
            format!(
                "Tool Name: {}\nTool Description: {}",
                delegate.name,
                delegate.description()
            ),
            vec![delegate.name.clone()],
        );
        let task_input = self.task_input(&briefing, context)?;

        // The manager's single action is resolved here, never by the adapter.
        let no_tools = ToolAdapter::new();
        let info = AgentInfo {
            role: &self.agent.role,
            goal: &goal,
            backstory: &backstory,
        };
        let mut executor = CrewAgentExecutor::with_prompts(
            self.llm.clone(),
            info,
            &task_input,
            prompts,
            &no_tools,
            self.agent.max_iter,
        )
        .with_verbose(self.agent.verbose || verbose);

        let result = self.decide(&mut executor, &delegate).await;
        usage.add_usage_metrics(&executor.usage());

        match result {
            Err(ExecutionError::IterationLimit(limit)) => Err(ManagerDelegationError {
                task: task.label(),
                reason: format!(
                    "no valid delegation within the manager's budget of {} iterations",
                    limit.max_iter
                ),
            }
            .into()),
            other => other,
        }
    }

    async fn decide(
        &self,
        executor: &mut CrewAgentExecutor<'_>,
        delegate: &DelegateWorkTool,
    ) -> Result<Assignment, ExecutionError> {
        loop {
            let action = match executor.next_step().await? {
                ParseResult::Finish(finish) => {
                    log::info!("Manager '{}' answered the task itself", self.agent.role);
                    return Ok(Assignment::Answer(finish.output));
                }
                ParseResult::Action(action) => action,
            };

            if action.tool.trim() != DELEGATE_WORK_TOOL_NAME {
                let observation = executor.prompts().tool_not_found(&action.tool);
                executor.observe(&observation);
                continue;
            }
            let instructions = match DelegateWorkTool::parse_input(&action.tool_input) {
                Ok(instructions) => instructions,
                Err(observation) => {
                    executor.observe(&observation);
                    continue;
                }
            };
            match delegate.resolve_coworker(&instructions.coworker) {
                Ok(role) => {
                    log::info!("Manager '{}' delegated to '{}'", self.agent.role, role);
                    return Ok(Assignment::Delegate {
                        coworker: role.to_string(),
                        instructions,
                    });
                }
                Err(observation) => {
                    log::debug!(
                        "Manager picked unavailable coworker '{}'",
                        instructions.coworker
                    );
                    executor.observe(&observation);
                }
            }
        }
    }

    fn task_input(
        &self,
        briefing: &Briefing<'_>,
        context: &ExecutionContext,
    ) -> Result<String, ExecutionError> {
        let task = &briefing.plan[briefing.position];
        let mut input = task.prompt();

        input.push_str("\n\nCrew plan:");
        for (i, planned) in briefing.plan.iter().enumerate() {
            let status = match briefing.completed.get(i) {
                Some(output) => format!("done by {}", output.agent),
                None if i == briefing.position => "current".to_string(),
                None => "pending".to_string(),
            };
            input.push_str(&format!("\n{}. [{}] {}", i + 1, status, planned.label()));
        }

        input.push_str("\n\nCoworkers you can delegate to:");
        for coworker in briefing.coworkers {
            let (goal, _) = coworker.interpolated(context)?;
            input.push_str(&format!("\n- {}: {}", coworker.role, goal));
            if !coworker.tools.is_empty() {
                input.push_str(&format!(" (tools: {})", coworker.tools.join(", ")));
            }
        }

        if let Some(failed) = briefing.failed {
            input.push_str(&format!(
                "\n\n{} could not complete this task: {}\nDelegate it again.",
                failed.role, failed.error
            ));
        }

        input.push_str(&format!(
            "\n\nUse the `{}` action to hand this task to exactly one coworker.",
            DELEGATE_WORK_TOOL_NAME
        ));

        Ok(task_with_context(
            &input,
            &completed_context(briefing.completed),
        ))
    }
}

/// Raw outputs of completed tasks, as context for the next one.
pub(crate) fn completed_context(completed: &[TaskOutput]) -> String {
    completed
        .iter()
        .map(|o| o.raw.as_str())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLLM;

    fn delegate_to(coworker: &str) -> String {
        format!(
            "Thought: pick\nAction: {}\nAction Input: {{\"task\": \"Write it\", \"context\": \"notes\", \"coworker\": \"{}\"}}",
            DELEGATE_WORK_TOOL_NAME, coworker
        )
    }

    fn plan() -> Vec<Task> {
        vec![Task::new("Write the report", "A report")]
    }

    #[test]
    fn test_resolve_requires_llm() {
        assert!(matches!(
            Manager::resolve(None, None),
            Err(ConfigurationError::MissingManagerLlm)
        ));

        let llm: Arc<dyn BaseLLM> = ScriptedLLM::new(Vec::<String>::new());
        let manager = Manager::resolve(None, Some(llm)).unwrap();
        assert_eq!(manager.role(), slices::MANAGER_ROLE);

        let custom = Agent::new("Lead", "Lead the team", "Seasoned").with_llm(ScriptedLLM::new(
            Vec::<String>::new(),
        ));
        assert_eq!(Manager::resolve(Some(&custom), None).unwrap().role(), "Lead");
    }

    #[tokio::test]
    async fn test_invalid_coworker_is_fed_back() {
        let llm = ScriptedLLM::new([delegate_to("A"), delegate_to("b")]);
        let manager = Manager::resolve(None, Some(llm.clone() as Arc<dyn BaseLLM>)).unwrap();
        let b = Agent::new("B", "Write", "Writer").with_allow_delegation(true);
        let coworkers = [&b];
        let tasks = plan();
        let briefing = Briefing {
            plan: &tasks,
            position: 0,
            completed: &[],
            coworkers: &coworkers,
            failed: None,
        };
        let mut usage = UsageMetrics::default();

        let assignment = manager
            .assign(briefing, &ExecutionContext::default(), false, &mut usage)
            .await
            .unwrap();

        match assignment {
            Assignment::Delegate {
                coworker,
                instructions,
            } => {
                assert_eq!(coworker, "B");
                assert_eq!(instructions.task, "Write it");
                assert_eq!(instructions.context, "notes");
            }
            other => panic!("unexpected assignment: {:?}", other),
        }
        assert_eq!(llm.calls(), 2);
        assert!(llm.prompts()[1].contains("Coworker 'A' not found"));
        assert_eq!(usage.successful_requests, 2);
    }

    #[tokio::test]
    async fn test_final_answer_short_circuits() {
        let llm = ScriptedLLM::new(["Thought: done\nFinal Answer: Already covered."]);
        let manager = Manager::resolve(None, Some(llm as Arc<dyn BaseLLM>)).unwrap();
        let b = Agent::new("B", "Write", "Writer");
        let tasks = plan();
        let assignment = manager
            .assign(
                Briefing {
                    plan: &tasks,
                    position: 0,
                    completed: &[],
                    coworkers: &[&b],
                    failed: None,
                },
                &ExecutionContext::default(),
                false,
                &mut UsageMetrics::default(),
            )
            .await
            .unwrap();
        assert_eq!(assignment, Assignment::Answer("Already covered.".into()));
    }

    #[tokio::test]
    async fn test_exhausted_budget_is_delegation_error() {
        let llm = ScriptedLLM::new([delegate_to("Nobody"), delegate_to("Nobody")]);
        let custom = Agent::new("Lead", "Lead", "Lead").with_max_iter(2);
        let manager = Manager::resolve(Some(&custom), Some(llm as Arc<dyn BaseLLM>)).unwrap();
        let b = Agent::new("B", "Write", "Writer");
        let tasks = plan();

        let err = manager
            .assign(
                Briefing {
                    plan: &tasks,
                    position: 0,
                    completed: &[],
                    coworkers: &[&b],
                    failed: None,
                },
                &ExecutionContext::default(),
                false,
                &mut UsageMetrics::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::ManagerDelegation(e) if e.task == "Write the report"));
    }

    #[tokio::test]
    async fn test_briefing_lists_plan_and_failure() {
        let llm = ScriptedLLM::new([delegate_to("C")]);
        let manager = Manager::resolve(None, Some(llm.clone() as Arc<dyn BaseLLM>)).unwrap();
        let c = Agent::new("C", "Edit {topic}", "Editor").with_tools(["search"]);
        let tasks = vec![
            Task::new("Research", "Notes"),
            Task::new("Write the report", "A report"),
        ];
        let completed = vec![TaskOutput::new(&tasks[0], "B", "the notes")];
        let error: ExecutionError =
            crate::utilities::errors::ToolInvocationError::new("search", "down").into();
        let context = ExecutionContext::default().with_input("topic", "Rust");

        manager
            .assign(
                Briefing {
                    plan: &tasks,
                    position: 1,
                    completed: &completed,
                    coworkers: &[&c],
                    failed: Some(FailedAttempt {
                        role: "B",
                        error: &error,
                    }),
                },
                &context,
                false,
                &mut UsageMetrics::default(),
            )
            .await
            .unwrap();

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("1. [done by B] Research"));
        assert!(prompt.contains("2. [current] Write the report"));
        assert!(prompt.contains("- C: Edit Rust (tools: search)"));
        assert!(prompt.contains("B could not complete this task: tool 'search' failed: down"));
        assert!(prompt.contains("the notes"));
    }
}

//! # minicrew
//!
//! A minimal multi-agent task pipeline. Role-playing agents, each driven by
//! a language model and a set of tools, work through an ordered list of
//! tasks either one after another (sequential process) or under an
//! LLM-driven manager that delegates each task to an eligible agent
//! (hierarchical process).
//!
//! ```no_run
//! use std::collections::HashMap;
//! use minicrew::{Agent, AgentRegistry, Crew, Task, TaskGraph};
//! use minicrew::config::Settings;
//! use minicrew::llm::default_llm;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let settings = Settings::load();
//! let llm = default_llm(&settings)?;
//! let agents = AgentRegistry::new().with_agent(
//!     Agent::new("Writer", "Write about {topic}", "A seasoned writer.").with_llm(llm),
//! )?;
//! let tasks = TaskGraph::new()
//!     .with_task(Task::new("Write a short post about {topic}", "A post").with_agent("Writer"));
//!
//! let inputs = HashMap::from([("topic".to_string(), "Rust".to_string())]);
//! let output = Crew::new(agents, tasks).kickoff(inputs).await?;
//! println!("{}", output.finalize());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod agents;
pub mod config;
pub mod context;
pub mod crew;
pub mod crews;
pub mod llm;
pub mod llms;
pub mod process;
pub mod project;
pub mod task;
pub mod tasks;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tools;
pub mod types;
pub mod utilities;

use std::collections::HashMap;
use std::sync::Arc;

pub use agent::{Agent, AgentRegistry};
pub use context::ExecutionContext;
pub use crew::Crew;
pub use crews::crew_output::CrewOutput;
pub use crews::execution::ExecutionState;
pub use llms::base_llm::BaseLLM;
pub use process::Process;
pub use task::Task;
pub use tasks::task_graph::TaskGraph;
pub use tasks::task_output::TaskOutput;
pub use tools::base_tool::{BaseTool, Tool};
pub use tools::tool_adapter::ToolAdapter;
pub use types::usage_metrics::UsageMetrics;
pub use utilities::errors::{CrewError, ExecutionError};

use crews::execution::{CrewRun, RunPlan};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run `graph` with the agents in `registry` under `process`.
///
/// The free-function form of [`Crew::kickoff`]: the registry, graph and
/// tools are only borrowed, so they can be shared between runs.
///
/// # Errors
///
/// A [`CrewError`] carrying the failure and the task outputs completed
/// before it.
pub async fn run(
    registry: &AgentRegistry,
    graph: &TaskGraph,
    inputs: HashMap<String, String>,
    process: Process,
    tools: &ToolAdapter,
    manager_llm: Option<Arc<dyn BaseLLM>>,
) -> Result<CrewOutput, CrewError> {
    let plan = RunPlan {
        agents: registry,
        tasks: graph,
        process,
        tools,
        manager_agent: None,
        manager_llm,
        verbose: false,
        task_callback: None,
    };
    CrewRun::new(plan, ExecutionContext::new(inputs)).execute().await
}

//! Crew definition files.
//!
//! A crew can be described in YAML instead of code:
//!
//! ```yaml
//! process: sequential
//! agents:
//!   - role: Venue Finder
//!     goal: Find venues for {conference_name}
//!     backstory: Knows every hall in town.
//!     tools: [search]
//!     max_iter: 3
//! tasks:
//!   - description: List venues for {conference_name}
//!     expected_output: A list of venues
//!     agent: Venue Finder
//! inputs:
//!   conference_name: RustConf
//! ```
//!
//! Agents without an `llm` use the configured default model.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::{Agent, AgentRegistry, DEFAULT_MAX_ITER};
use crate::config::Settings;
use crate::crew::Crew;
use crate::llm::create_llm;
use crate::llms::base_llm::{BaseLLM, LLMError};
use crate::process::Process;
use crate::task::Task;
use crate::tasks::task_graph::TaskGraph;
use crate::tools::tool_adapter::ToolAdapter;
use crate::utilities::errors::ConfigurationError;

fn default_max_iter() -> u32 {
    DEFAULT_MAX_ITER
}

fn default_true() -> bool {
    true
}

/// Errors loading or building a crew definition.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to read crew definition '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid crew definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Llm(#[from] LLMError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// One agent entry of a crew definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub allow_delegation: bool,
    #[serde(default = "default_max_iter")]
    pub max_iter: u32,
    /// Model name, e.g. `ollama/tinyllama`.
    #[serde(default)]
    pub llm: Option<String>,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_true")]
    pub cache: bool,
}

/// A crew described in YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub process: Process,
    #[serde(default)]
    pub verbose: bool,
    pub agents: Vec<AgentDefinition>,
    pub tasks: Vec<Task>,
    /// Model for the hierarchical manager. Defaults to the configured model.
    #[serde(default)]
    pub manager_llm: Option<String>,
    /// Default run inputs; command-line inputs override them.
    #[serde(default)]
    pub inputs: HashMap<String, String>,
}

impl CrewDefinition {
    pub fn from_yaml(yaml: &str) -> Result<Self, ProjectError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a definition file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("Loaded crew definition from {}", path.display());
        Self::from_yaml(&yaml)
    }

    /// Default inputs overlaid with `overrides`.
    pub fn inputs_with(&self, overrides: HashMap<String, String>) -> HashMap<String, String> {
        let mut inputs = self.inputs.clone();
        inputs.extend(overrides);
        inputs
    }

    /// Build a ready crew, creating one LLM client per distinct model.
    ///
    /// # Errors
    ///
    /// - [`ProjectError::Llm`] for an unknown provider prefix.
    /// - [`ProjectError::Configuration`] for duplicate roles or a zero
    ///   iteration budget.
    pub fn build(&self, settings: &Settings, tools: ToolAdapter) -> Result<Crew, ProjectError> {
        let mut clients: HashMap<String, Arc<dyn BaseLLM>> = HashMap::new();
        let mut client_for = |model: &str| -> Result<Arc<dyn BaseLLM>, LLMError> {
            if let Some(llm) = clients.get(model) {
                return Ok(llm.clone());
            }
            let llm = create_llm(model, settings)?;
            clients.insert(model.to_string(), llm.clone());
            Ok(llm)
        };

        let mut registry = AgentRegistry::new();
        for def in &self.agents {
            let model = def.llm.as_deref().unwrap_or(&settings.model);
            let agent = Agent::new(&def.role, &def.goal, &def.backstory)
                .with_tools(def.tools.iter().cloned())
                .with_allow_delegation(def.allow_delegation)
                .with_max_iter(def.max_iter)
                .with_verbose(def.verbose)
                .with_cache(def.cache)
                .with_llm(client_for(model)?);
            registry.register(agent)?;
        }

        let tasks: TaskGraph = self.tasks.iter().cloned().collect();
        let mut crew = Crew::new(registry, tasks)
            .with_process(self.process)
            .with_tools(tools)
            .with_verbose(self.verbose || settings.verbose);
        if let Some(name) = &self.name {
            crew = crew.with_name(name);
        }
        if self.process == Process::Hierarchical {
            let model = self.manager_llm.as_deref().unwrap_or(&settings.model);
            crew = crew.with_manager_llm(client_for(model)?);
        }
        Ok(crew)
    }
}

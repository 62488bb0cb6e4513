//! Agent Registry.
//!
//! Holds agent definitions keyed by role, in registration order. A registry
//! is read-only while a crew runs; several runs may share one through an
//! `Arc`.

use crate::agent::core::Agent;
use crate::tools::agent_tools::delegate_work_tool::sanitize_agent_name;
use crate::utilities::errors::ConfigurationError;

/// Registered agents in registration order.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `agent`.
    ///
    /// Roles are compared the way the manager matches coworker names
    /// (case-insensitive, whitespace collapsed), so two roles that would be
    /// indistinguishable to the manager cannot both be registered.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::DuplicateRole`] if the role is taken; the
    ///   registry keeps the earlier agent.
    /// - [`ConfigurationError::InvalidIterationBudget`] for `max_iter == 0`.
    pub fn register(&mut self, agent: Agent) -> Result<(), ConfigurationError> {
        if self.position(&agent.role).is_some() {
            return Err(ConfigurationError::DuplicateRole { role: agent.role });
        }
        if agent.max_iter == 0 {
            return Err(ConfigurationError::InvalidIterationBudget { role: agent.role });
        }
        log::debug!("Registered agent '{}'", agent.role);
        self.agents.push(agent);
        Ok(())
    }

    /// Builder form of [`AgentRegistry::register`].
    pub fn with_agent(mut self, agent: Agent) -> Result<Self, ConfigurationError> {
        self.register(agent)?;
        Ok(self)
    }

    fn position(&self, role: &str) -> Option<usize> {
        let wanted = sanitize_agent_name(role);
        self.agents
            .iter()
            .position(|a| sanitize_agent_name(&a.role) == wanted)
    }

    /// Look up an agent by role.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::UnknownAgent`] if no agent has that role.
    pub fn get(&self, role: &str) -> Result<&Agent, ConfigurationError> {
        self.position(role)
            .map(|i| &self.agents[i])
            .ok_or_else(|| ConfigurationError::UnknownAgent {
                role: role.to_string(),
            })
    }

    /// Whether an agent with `role` is registered.
    pub fn contains(&self, role: &str) -> bool {
        self.position(role).is_some()
    }

    /// All agents in registration order.
    ///
    /// The iterator is lazy and `Clone`, so it can be restarted.
    pub fn all(&self) -> impl Iterator<Item = &Agent> + Clone + '_ {
        self.agents.iter()
    }

    /// Agents the hierarchical manager may delegate to.
    pub fn delegation_eligible(&self) -> impl Iterator<Item = &Agent> + Clone + '_ {
        self.agents.iter().filter(|a| a.allow_delegation)
    }

    /// Roles in registration order.
    pub fn roles(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.role.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(role: &str, goal: &str) -> Agent {
        Agent::new(role, goal, "backstory")
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = AgentRegistry::new();
        registry.register(agent("Venue Finder", "find")).unwrap();
        assert_eq!(registry.get("Venue Finder").unwrap().goal, "find");
        assert_eq!(registry.get("venue  finder").unwrap().goal, "find");
        assert!(matches!(
            registry.get("Caterer"),
            Err(ConfigurationError::UnknownAgent { role }) if role == "Caterer"
        ));
    }

    #[test]
    fn test_duplicate_role_keeps_first() {
        let mut registry = AgentRegistry::new();
        registry.register(agent("Writer", "first")).unwrap();
        let err = registry.register(agent("Writer", "second")).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateRole {
                role: "Writer".into()
            }
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Writer").unwrap().goal, "first");
    }

    #[test]
    fn test_zero_budget_rejected() {
        let mut registry = AgentRegistry::new();
        let err = registry
            .register(agent("Writer", "w").with_max_iter(0))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidIterationBudget { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_all_is_ordered_and_restartable() {
        let registry = AgentRegistry::new()
            .with_agent(agent("A", "a"))
            .and_then(|r| r.with_agent(agent("B", "b").with_allow_delegation(true)))
            .and_then(|r| r.with_agent(agent("C", "c")))
            .unwrap();

        let all = registry.all();
        let first: Vec<_> = all.clone().map(|a| a.role.as_str()).collect();
        let second: Vec<_> = all.map(|a| a.role.as_str()).collect();
        assert_eq!(first, vec!["A", "B", "C"]);
        assert_eq!(first, second);

        let eligible: Vec<_> = registry.delegation_eligible().map(|a| a.role.as_str()).collect();
        assert_eq!(eligible, vec!["B"]);
        assert_eq!(registry.roles(), vec!["A", "B", "C"]);
    }
}

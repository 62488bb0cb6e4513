//! Per-run execution context.
//!
//! Holds the `{placeholder}` values a run was started with. Each run owns
//! its context; nothing here is shared between runs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::utilities::errors::MissingInputError;
use crate::utilities::string_utils::interpolate_only;

/// Inputs substituted into task descriptions before execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Placeholder name to value.
    pub inputs: HashMap<String, String>,
}

impl ExecutionContext {
    pub fn new(inputs: HashMap<String, String>) -> Self {
        Self { inputs }
    }

    /// Builder: add one input.
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).map(String::as_str)
    }

    /// Render `template` against these inputs.
    pub fn interpolate(&self, template: &str) -> Result<String, MissingInputError> {
        interpolate_only(template, &self.inputs)
    }
}

impl From<HashMap<String, String>> for ExecutionContext {
    fn from(inputs: HashMap<String, String>) -> Self {
        Self::new(inputs)
    }
}

impl<K, V> FromIterator<(K, V)> for ExecutionContext
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_with_builder_inputs() {
        let ctx = ExecutionContext::default().with_input("topic", "AI in healthcare");
        assert_eq!(
            ctx.interpolate("Collect data about {topic}.").unwrap(),
            "Collect data about AI in healthcare."
        );
        assert_eq!(ctx.get("topic"), Some("AI in healthcare"));
    }

    #[test]
    fn test_from_iter() {
        let ctx: ExecutionContext = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(ctx.inputs.len(), 2);
    }
}

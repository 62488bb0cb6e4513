//! Cache handler for tool usage results.
//!
//! Provides thread-safe in-memory caching for tool outputs based on
//! tool name and input. The cache key is built from "{tool}-{input}".

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Handles caching of tool execution results.
///
/// One handler is created per run and shared by every agent turn in it.
/// Only successful outputs are stored, so a failed call is never replayed.
#[derive(Debug, Clone, Default)]
pub struct CacheHandler {
    /// Internal cache storage, keyed by "{tool}-{input}".
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl CacheHandler {
    /// Create a new empty `CacheHandler`.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(tool: &str, input: &str) -> String {
        format!("{}-{}", tool, input.trim())
    }

    /// Add a tool result to the cache.
    pub fn add(&self, tool: &str, input: &str, output: impl Into<String>) {
        self.cache.write().insert(Self::key(tool, input), output.into());
    }

    /// Retrieve a cached tool result.
    pub fn read(&self, tool: &str, input: &str) -> Option<String> {
        self.cache.read().get(&Self::key(tool, input)).cloned()
    }

    /// Clear all cached entries.
    pub fn clear(&self) {
        self.cache.write().clear();
    }

    /// Get the number of cached entries.
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

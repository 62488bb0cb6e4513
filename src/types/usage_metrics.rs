//! Usage metrics tracking for crew execution.

use serde::{Deserialize, Serialize};

/// Token usage across LLM calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetrics {
    /// Total number of tokens used.
    pub total_tokens: u64,
    /// Number of tokens used in prompts.
    pub prompt_tokens: u64,
    /// Number of tokens used in completions.
    pub completion_tokens: u64,
    /// Number of successful requests made.
    pub successful_requests: u64,
}

impl UsageMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Usage for one successful request.
    pub fn from_request(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            total_tokens: prompt_tokens + completion_tokens,
            prompt_tokens,
            completion_tokens,
            successful_requests: 1,
        }
    }

    /// Add usage metrics from another UsageMetrics object.
    pub fn add_usage_metrics(&mut self, other: &UsageMetrics) {
        self.total_tokens += other.total_tokens;
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.successful_requests += other.successful_requests;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_usage_metrics() {
        let mut total = UsageMetrics::new();
        total.add_usage_metrics(&UsageMetrics::from_request(10, 5));
        total.add_usage_metrics(&UsageMetrics::from_request(3, 2));
        assert_eq!(total.total_tokens, 20);
        assert_eq!(total.prompt_tokens, 13);
        assert_eq!(total.completion_tokens, 7);
        assert_eq!(total.successful_requests, 2);
    }
}

//! Scripted collaborators for tests, behind the `testing` feature.
//!
//! [`ScriptedLLM`] replays canned responses in order and records every
//! conversation it was shown. [`CountingTool`] returns a fixed reply and
//! counts its invocations.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::llms::base_llm::{BaseLLM, LLMError, LLMMessage, LLMResponse};
use crate::tools::base_tool::{BaseTool, ToolError};
use crate::types::usage_metrics::UsageMetrics;

/// LLM that answers from a fixed script.
///
/// Each call pops the next reply. An exhausted script yields
/// [`LLMError::EmptyResponse`]; a reply starting with `!error ` yields
/// [`LLMError::Other`] with the rest of the line.
#[derive(Debug, Default)]
pub struct ScriptedLLM {
    replies: Mutex<VecDeque<String>>,
    seen: Mutex<Vec<Vec<LLMMessage>>>,
}

impl ScriptedLLM {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Number of calls served so far.
    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    /// Replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }

    /// For each call, the conversation flattened into one string.
    pub fn prompts(&self) -> Vec<String> {
        self.seen
            .lock()
            .iter()
            .map(|messages| {
                messages
                    .iter()
                    .map(|m| m.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect()
    }
}

#[async_trait]
impl BaseLLM for ScriptedLLM {
    fn model(&self) -> &str {
        "scripted"
    }

    fn provider(&self) -> &str {
        "scripted"
    }

    async fn call(&self, messages: &[LLMMessage], _stop: &[String]) -> Result<LLMResponse, LLMError> {
        self.seen.lock().push(messages.to_vec());
        let reply = self
            .replies
            .lock()
            .pop_front()
            .ok_or(LLMError::EmptyResponse)?;
        if let Some(message) = reply.strip_prefix("!error ") {
            return Err(LLMError::Other(message.to_string()));
        }
        Ok(LLMResponse::new(reply).with_usage(UsageMetrics::from_request(10, 5)))
    }
}

/// Tool that returns a fixed reply (or a fixed failure) and counts calls.
#[derive(Debug)]
pub struct CountingTool {
    name: String,
    reply: Result<String, String>,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl CountingTool {
    /// A tool that always succeeds with `reply`.
    pub fn new(name: impl Into<String>, reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            reply: Ok(reply.into()),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        })
    }

    /// A tool that always fails with `message`.
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            reply: Err(message.into()),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        })
    }

    /// Number of times the tool ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Inputs received, in order.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl BaseTool for CountingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Scripted test tool"
    }

    async fn run(&self, input: &str) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().push(input.to_string());
        self.reply.clone().map_err(ToolError::Execution)
    }
}

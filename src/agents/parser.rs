//! Agent output parsing for ReAct-style LLM responses.
//!
//! Converts raw model text into an [`AgentAction`] (use a tool) or an
//! [`AgentFinish`] (final answer).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// The text prefix for a final answer.
pub const FINAL_ANSWER_ACTION: &str = "Final Answer:";

/// Error message when action is missing after thought.
const MISSING_ACTION_AFTER_THOUGHT_ERROR_MESSAGE: &str =
    "I just got this: I couldn't find an Action after the Thought.";

/// Error message when action input is missing after action.
const MISSING_ACTION_INPUT_AFTER_ACTION_ERROR_MESSAGE: &str =
    "I just got this: I found an Action but couldn't find a valid Action Input right after it.";

static ACTION_INPUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:\s*(.+?)\s*(?:\n|\r\n?)Action\s*\d*\s*Input\s*\d*\s*:\s*(.*)")
        .expect("Invalid regex")
});
static ACTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Action\s*\d*\s*:").expect("Invalid regex"));
static ACTION_INPUT_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Action\s*\d*\s*Input\s*\d*\s*:").expect("Invalid regex"));

// ---------------------------------------------------------------------------
// AgentAction / AgentFinish
// ---------------------------------------------------------------------------

/// Represents an action to be taken by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAction {
    /// The agent's reasoning/thought before taking the action.
    pub thought: String,
    /// The name of the tool to use.
    pub tool: String,
    /// The input to pass to the tool.
    pub tool_input: String,
    /// The raw text that was parsed.
    pub text: String,
}

/// Represents the final answer from an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFinish {
    /// The agent's reasoning/thought before the final answer.
    pub thought: String,
    /// The final output.
    pub output: String,
    /// The raw text that was parsed.
    pub text: String,
}

/// Result of parsing agent output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    /// The agent wants to take an action (use a tool).
    Action(AgentAction),
    /// The agent has a final answer.
    Finish(AgentFinish),
}

/// Raised when output parsing fails. The message is fed back to the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct OutputParserError {
    /// The error message describing what went wrong.
    pub error: String,
}

impl OutputParserError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse function
// ---------------------------------------------------------------------------

/// Parse agent output text into `AgentAction` or `AgentFinish`.
///
/// **Action format**:
/// ```text
/// Thought: agent thought here
/// Action: search
/// Action Input: what is the temperature in SF?
/// ```
///
/// **Final answer format**:
/// ```text
/// Thought: agent thought here
/// Final Answer: The temperature is 100 degrees
/// ```
///
/// A final answer wins when both are present.
///
/// # Errors
///
/// Returns `OutputParserError` if the text format is invalid.
pub fn parse(text: &str) -> Result<ParseResult, OutputParserError> {
    let thought = extract_thought(text);

    if let Some(idx) = text.rfind(FINAL_ANSWER_ACTION) {
        let final_answer = text[idx + FINAL_ANSWER_ACTION.len()..].trim();
        return Ok(ParseResult::Finish(AgentFinish {
            thought,
            output: clean_trailing_backticks(final_answer),
            text: text.to_string(),
        }));
    }

    if let Some(caps) = ACTION_INPUT_RE.captures(text) {
        let action = caps.get(1).map_or("", |m| m.as_str());
        let action_input = caps.get(2).map_or("", |m| m.as_str()).trim();
        let tool_input = clean_trailing_backticks(action_input);

        return Ok(ParseResult::Action(AgentAction {
            thought,
            tool: clean_action(action),
            tool_input: safe_repair_json(tool_input.trim_matches('"')),
            text: text.to_string(),
        }));
    }

    if !ACTION_RE.is_match(text) {
        return Err(OutputParserError::new(format!(
            "{}\nYou MUST use the following format:\n\
             Thought: [your thought]\n\
             Action: [tool name]\n\
             Action Input: [tool input]\n\
             or\n\
             Thought: [your thought]\n\
             Final Answer: [your final answer]",
            MISSING_ACTION_AFTER_THOUGHT_ERROR_MESSAGE
        )));
    }

    if !ACTION_INPUT_ONLY_RE.is_match(text) {
        return Err(OutputParserError::new(
            MISSING_ACTION_INPUT_AFTER_ACTION_ERROR_MESSAGE,
        ));
    }

    Err(OutputParserError::new(
        "Could not parse the output. Please use the correct format.",
    ))
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Extract the thought portion from the text.
fn extract_thought(text: &str) -> String {
    let thought_index = text.find("\nAction").or_else(|| text.find("\nFinal Answer"));
    match thought_index {
        Some(idx) => text[..idx].replace("```", "").trim().to_string(),
        None => String::new(),
    }
}

/// Clean action string by removing non-essential formatting characters.
fn clean_action(text: &str) -> String {
    text.trim().trim_matches('*').trim().to_string()
}

/// Drop an unmatched trailing set of triple backticks.
fn clean_trailing_backticks(text: &str) -> String {
    if text.ends_with("```") && text.matches("```").count() % 2 != 0 {
        text[..text.len() - 3].trim_end().to_string()
    } else {
        text.to_string()
    }
}

/// Repair common LLM JSON slips (triple quotes) when that yields valid JSON.
fn safe_repair_json(tool_input: &str) -> String {
    if tool_input.starts_with('[') && tool_input.ends_with(']') {
        return tool_input.to_string();
    }

    let cleaned = tool_input.replace("\"\"\"", "\"");
    if serde_json::from_str::<Value>(&cleaned).is_ok() {
        cleaned
    } else {
        tool_input.to_string()
    }
}

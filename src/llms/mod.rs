//! LLM infrastructure.
//!
//! - [`base_llm`] - The trait every language-model collaborator implements
//! - [`providers`] - HTTP-backed providers (Ollama, OpenAI-compatible)

pub mod base_llm;
pub mod providers;

pub use base_llm::{BaseLLM, LLMError, LLMMessage, LLMResponse, MessageRole};

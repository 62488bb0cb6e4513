//! LLM provider implementations.
//!
//! | Provider | Module | Endpoint |
//! |----------|--------|----------|
//! | Ollama | [`ollama`] | `POST {base}/api/chat` |
//! | OpenAI-compatible | [`openai`] | `POST {base}/chat/completions` |

pub mod ollama;
pub mod openai;
pub mod utils;

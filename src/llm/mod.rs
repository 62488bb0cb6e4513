//! LLM factory.
//!
//! Turns a model string such as `"ollama/tinyllama"`, `"openai/gpt-4o-mini"`
//! or a bare `"gpt-4o-mini"` into a ready [`BaseLLM`].

use std::sync::Arc;

use crate::config::Settings;
use crate::llms::base_llm::{extract_provider, BaseLLM, LLMError};
use crate::llms::providers::ollama::OllamaCompletion;
use crate::llms::providers::openai::OpenAICompletion;

/// Create an LLM instance for `model`.
///
/// A bare model name is treated as OpenAI-compatible.
///
/// # Errors
///
/// Returns [`LLMError::Configuration`] for an unknown provider prefix.
pub fn create_llm(model: &str, settings: &Settings) -> Result<Arc<dyn BaseLLM>, LLMError> {
    let (provider, name) = extract_provider(model.trim());
    log::debug!(
        "Creating LLM instance: provider={}, model={}",
        provider.unwrap_or("openai"),
        name
    );

    match provider.map(str::to_lowercase).as_deref() {
        Some("ollama") => Ok(Arc::new(OllamaCompletion::new(
            name,
            Some(settings.ollama_base_url.clone()),
        ))),
        Some("openai") | None => Ok(Arc::new(OpenAICompletion::new(
            name,
            settings.openai_api_key.clone(),
            settings.openai_base_url.clone(),
        ))),
        Some(other) => Err(LLMError::Configuration(format!(
            "unknown LLM provider '{}' in model '{}'; expected 'ollama/<model>' or 'openai/<model>'",
            other, model
        ))),
    }
}

/// Create the default LLM named by [`Settings::model`].
pub fn default_llm(settings: &Settings) -> Result<Arc<dyn BaseLLM>, LLMError> {
    create_llm(&settings.model, settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama() {
        let llm = create_llm("ollama/tinyllama", &Settings::default()).unwrap();
        assert_eq!(llm.provider(), "ollama");
        assert_eq!(llm.model(), "tinyllama");
    }

    #[test]
    fn test_create_openai_bare_name() {
        let llm = create_llm("gpt-4o-mini", &Settings::default()).unwrap();
        assert_eq!(llm.provider(), "openai");
        assert_eq!(llm.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_unknown_provider() {
        let err = create_llm("bedrock/claude", &Settings::default()).unwrap_err();
        assert!(err.to_string().contains("unknown LLM provider 'bedrock'"));
    }

    #[test]
    fn test_default_llm() {
        let llm = default_llm(&Settings::default()).unwrap();
        assert_eq!(llm.model(), "tinyllama");
    }
}

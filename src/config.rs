//! Process-wide settings, read once at startup.
//!
//! API keys and model selection come from the environment (after loading a
//! `.env` file, if present). The resulting [`Settings`] is immutable and is
//! passed by reference to whatever builds LLMs and tools.

use std::collections::HashMap;
use std::env;

use serde::{Deserialize, Serialize};

use crate::llms::providers::ollama::DEFAULT_OLLAMA_BASE_URL;

/// Default model used when neither the crew file nor the environment names one.
pub const DEFAULT_MODEL: &str = "ollama/tinyllama";

/// Environment variable names.
pub mod vars {
    pub const MODEL: &str = "MINICREW_MODEL";
    pub const VERBOSE: &str = "MINICREW_VERBOSE";
    pub const OLLAMA_BASE_URL: &str = "OLLAMA_BASE_URL";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
    pub const SERPER_API_KEY: &str = "SERPER_API_KEY";

    /// Every variable [`Settings`](super::Settings) reads.
    pub const ALL: [&str; 6] = [
        MODEL,
        VERBOSE,
        OLLAMA_BASE_URL,
        OPENAI_API_KEY,
        OPENAI_BASE_URL,
        SERPER_API_KEY,
    ];
}

/// Startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Default `provider/model` string for agents that don't name one.
    pub model: String,
    /// Ollama server address.
    pub ollama_base_url: String,
    /// OpenAI API key.
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    /// Override for the OpenAI-compatible base URL.
    pub openai_base_url: Option<String>,
    /// serper.dev API key for the search tool.
    #[serde(skip_serializing)]
    pub serper_api_key: Option<String>,
    /// Echo agent steps to stdout.
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            openai_api_key: None,
            openai_base_url: None,
            serper_api_key: None,
            verbose: false,
        }
    }
}

impl Settings {
    /// Load a `.env` file if one exists, then read the known variables from
    /// the process environment.
    ///
    /// Only the variables in [`vars::ALL`] are looked at; one that is not
    /// valid UTF-8 is ignored like an unset one.
    pub fn load() -> Self {
        if let Ok(path) = dotenv::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        let found = vars::ALL
            .iter()
            .filter_map(|key| match env::var(key) {
                Ok(value) => Some((key.to_string(), value)),
                Err(env::VarError::NotUnicode(_)) => {
                    log::warn!("Ignoring {}: value is not valid UTF-8", key);
                    None
                }
                Err(env::VarError::NotPresent) => None,
            })
            .collect();
        Self::from_vars(found)
    }

    /// Build settings from an explicit variable map.
    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Self {
            model: get(vars::MODEL).unwrap_or(defaults.model),
            ollama_base_url: get(vars::OLLAMA_BASE_URL).unwrap_or(defaults.ollama_base_url),
            openai_api_key: get(vars::OPENAI_API_KEY),
            openai_base_url: get(vars::OPENAI_BASE_URL),
            serper_api_key: get(vars::SERPER_API_KEY),
            verbose: get(vars::VERBOSE)
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_vars(HashMap::new());
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.model, "ollama/tinyllama");
    }

    #[test]
    fn test_reads_variables() {
        let settings = Settings::from_vars(vars(&[
            (vars::MODEL, "openai/gpt-4o-mini"),
            (vars::OPENAI_API_KEY, "sk-test"),
            (vars::SERPER_API_KEY, "serper"),
            (vars::VERBOSE, "TRUE"),
            (vars::OLLAMA_BASE_URL, "  "),
        ]));
        assert_eq!(settings.model, "openai/gpt-4o-mini");
        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.serper_api_key.as_deref(), Some("serper"));
        assert!(settings.verbose);
        assert_eq!(settings.ollama_base_url, DEFAULT_OLLAMA_BASE_URL);
    }

    #[test]
    fn test_keys_not_serialized() {
        let settings = Settings {
            openai_api_key: Some("sk-secret".into()),
            ..Settings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[cfg(unix)]
    #[test]
    fn test_load_ignores_non_utf8_environment() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        env::set_var("MINICREW_TEST_UNRELATED_BYTES", OsStr::from_bytes(b"f\xff"));
        let settings = Settings::load();
        env::remove_var("MINICREW_TEST_UNRELATED_BYTES");
        assert!(!settings.model.is_empty());
    }
}

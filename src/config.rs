use thiserror::Error;

use crate::dotenv::Environment;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_MODEL_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_PROMPT: &str = "Explain how AI works in a few words";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} not set in environment or .env file")]
    MissingCredential { var: &'static str },
    #[error("{var} is set in the environment but is not valid unicode")]
    NonUnicodeCredential { var: &'static str },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub model: String,
    pub model_base_url: String,
    pub prompt: String,
}

impl Config {
    pub fn from_env(env: &Environment) -> Self {
        Self::from_env_with(|key| env.get(key).map(str::to_string))
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        Self {
            model: non_empty(get_var("MODEL")).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_base_url: non_empty(get_var("MODEL_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_MODEL_BASE_URL.to_string()),
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }

    /// Replaces the default prompt with `args` joined by spaces, if any.
    pub fn with_prompt_args(mut self, args: &[String]) -> Self {
        if !args.is_empty() {
            self.prompt = args.join(" ");
        }
        self
    }
}

pub fn resolve_api_key(env: &Environment) -> Result<String, ConfigError> {
    if env.is_non_unicode(API_KEY_VAR) {
        return Err(ConfigError::NonUnicodeCredential { var: API_KEY_VAR });
    }
    match env.get(API_KEY_VAR) {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(ConfigError::MissingCredential { var: API_KEY_VAR }),
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

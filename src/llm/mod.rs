pub mod chat;

use crate::cli::Args;

/// Recognized credential variables, first present and non-empty wins.
pub const API_KEY_ENV_VARS: &[&str] = &[
    "GEMINI_API_KEY",
    "GOOGLE_API_KEY",
    "GOOGLE_GENAI_API_KEY",
    "GOOGLE_GENERATIVE_AI_API_KEY",
];

pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
}

impl LlmConfig {
    pub fn from_env(args: &Args) -> Self {
        Self {
            api_key: resolve_api_key(),
            completion_model: args.chat_model.clone(),
            base_url: args.chat_base_url.clone(),
        }
    }
}

pub fn resolve_api_key() -> Option<String> {
    first_non_empty(API_KEY_ENV_VARS.iter().map(|name| std::env::var(name).ok()))
}

fn first_non_empty<I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    values
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

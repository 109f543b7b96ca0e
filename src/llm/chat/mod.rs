pub mod gemini;

use async_trait::async_trait;
use serde::Deserialize;
use std::error::Error as StdError;
use std::sync::Arc;

use self::gemini::GeminiChatClient;
use super::LlmConfig;
use crate::models::chat::ChatMessage;

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Completes the active user prompt given the preceding conversation
    /// turns. One request, full response; no streaming.
    async fn complete(
        &self,
        history: &[ChatMessage],
        prompt: &str,
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>>;

    fn get_model(&self) -> String;
}

pub fn new_client(
    config: &LlmConfig,
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client = GeminiChatClient::from_config(config)?;
    Ok(Arc::new(client))
}

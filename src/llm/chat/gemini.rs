use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;

use super::{ChatClient, CompletionResponse};
use crate::llm::{LlmConfig, DEFAULT_CHAT_MODEL};
use crate::models::chat::ChatMessage;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    content: Option<GoogleContent>,
}

#[derive(Deserialize)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    #[serde(default)]
    text: String,
}

/// Maps the windowed conversation to the generateContent turn format:
/// history first, then the prompt as a trailing user turn.
fn contents_from(history: &[ChatMessage], prompt: &str) -> Vec<GeminiContent> {
    let mut contents: Vec<GeminiContent> = history
        .iter()
        .map(|m| GeminiContent {
            role: m.role.as_str(),
            parts: vec![GeminiPart {
                text: m.content.clone(),
            }],
        })
        .collect();
    contents.push(GeminiContent {
        role: "user",
        parts: vec![GeminiPart {
            text: prompt.to_string(),
        }],
    });
    contents
}

/// Joins the text parts of the first candidate. Anything missing along the
/// way reads as empty text; the caller decides what empty means.
fn extract_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

pub struct GeminiChatClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiChatClient {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| "Google API key is required for GeminiChatClient".to_string())?;
        Ok(Self::new(
            api_key,
            config.completion_model.clone(),
            config.base_url.clone(),
        ))
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn complete(
        &self,
        history: &[ChatMessage],
        prompt: &str,
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        );
        info!(
            "GeminiChatClient::complete() → model={} history_turns={}",
            self.model,
            history.len()
        );

        let payload = GenerateRequest {
            contents: contents_from(history, prompt),
        };

        let response = self.http.post(&url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Gemini API error (status {}): {}", status.as_u16(), body).into());
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(CompletionResponse {
            response: extract_text(parsed),
        })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::chat::{ChatMessage, ChatRequest, ErrorBody};

#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never completed (connect failure, closed socket, bad
    /// response body).
    #[error("{0}")]
    Request(String),

    /// The proxy answered with a non-2xx status; carries the error text it
    /// returned, or a generic status line when the body was unusable.
    #[error("{0}")]
    Api(String),
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends the full message log and returns the reply text.
    async fn send(&self, messages: Vec<ChatMessage>) -> Result<String, TransportError>;
}

pub struct HttpChatTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpChatTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(&self, messages: Vec<ChatMessage>) -> Result<String, TransportError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&ChatRequest { messages })
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("Request failed ({})", status.as_u16()));
            return Err(TransportError::Api(message));
        }

        // Lenient on the success path: a missing reply field reads as blank
        // and the session substitutes its fallback text.
        let body: Value = response
            .json()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let reply = body
            .get("reply")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(reply.to_string())
    }
}

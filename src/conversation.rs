use serde_json::Value;
use thiserror::Error;

use crate::models::chat::{ ChatMessage, Role };

/// Maximum number of turns forwarded upstream. Older turns fall off the
/// front of the window.
pub const HISTORY_WINDOW: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Expected JSON object body")]
    ExpectedObject,

    #[error("Expected {{ messages: [] }}")]
    ExpectedMessages,

    #[error("messages must be a non-empty array")]
    EmptyAfterFilter,

    #[error("Last message must have role 'user'")]
    LastNotUser,
}

/// A validated, windowed conversation split into the context turns and the
/// active query.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatTurns {
    pub history: Vec<ChatMessage>,
    pub prompt: String,
}

/// Lenient per-entry check: an entry counts only if it carries a known role
/// and a string content that is non-empty after trimming. Content is kept
/// as sent, untrimmed.
fn well_formed(entry: &Value) -> Option<ChatMessage> {
    let role = match entry.get("role").and_then(Value::as_str) {
        Some("user") => Role::User,
        Some("model") => Role::Model,
        _ => return None,
    };
    let content = entry.get("content").and_then(Value::as_str)?;
    if content.trim().is_empty() {
        return None;
    }
    Some(ChatMessage {
        role,
        content: content.to_string(),
    })
}

/// Validates a raw request body and reduces it to the turns sent upstream:
/// malformed entries are dropped silently, the remainder is capped to the
/// most recent [`HISTORY_WINDOW`] turns, and the final turn must be a user
/// message. Framework-independent on purpose.
pub fn validate_and_window(body: &Value) -> Result<ChatTurns, ValidationError> {
    if !body.is_object() {
        return Err(ValidationError::ExpectedObject);
    }

    let raw = body
        .get("messages")
        .and_then(Value::as_array)
        .ok_or(ValidationError::ExpectedMessages)?;

    let mut messages: Vec<ChatMessage> = raw.iter().filter_map(well_formed).collect();
    if messages.is_empty() {
        return Err(ValidationError::EmptyAfterFilter);
    }

    if messages.len() > HISTORY_WINDOW {
        messages.drain(..messages.len() - HISTORY_WINDOW);
    }

    let last = match messages.pop() {
        Some(last) => last,
        None => return Err(ValidationError::EmptyAfterFilter),
    };
    if last.role != Role::User {
        return Err(ValidationError::LastNotUser);
    }

    Ok(ChatTurns {
        history: messages,
        prompt: last.content,
    })
}

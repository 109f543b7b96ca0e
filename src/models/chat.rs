use serde::{ Serialize, Deserialize };

/// Conversation turn author. The upstream Gemini API uses the same two
/// role strings, so serialization doubles as the wire mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Request body for POST /api/chat.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Success body for POST /api/chat.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Error body shared by all non-200 responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

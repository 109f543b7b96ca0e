use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::chat::{ChatMessage, Role};

/// Seeded into every new session as the opening bot entry.
pub const GREETING: &str = "Hi there! 👋 I'm your Smart Food Finder assistant. How can I help you discover amazing food today?";

/// Shown when the proxy answers with blank text.
pub const EMPTY_REPLY_FALLBACK: &str = "(No response returned.)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingReply,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Author {
    User,
    Bot,
}

#[derive(Clone, Debug)]
pub struct LogEntry {
    pub id: Uuid,
    pub author: Author,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    fn new(author: Author, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Resolution of the single in-flight proxy call.
#[derive(Clone, Debug)]
pub enum ReplyOutcome {
    Reply(String),
    Failed(String),
}

/// Two-state conversation log. Transitions are driven entirely by
/// [`ChatSession::submit`] and [`ChatSession::resolve`]; the transport that
/// actually performs the request lives elsewhere.
pub struct ChatSession {
    log: Vec<LogEntry>,
    state: SessionState,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            log: vec![LogEntry::new(Author::Bot, GREETING)],
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Accepts a user submission and returns the full log as the outbound
    /// message list for the proxy. Blank text, or a submission while a reply
    /// is already in flight, is dropped without touching the log.
    pub fn submit(&mut self, text: &str) -> Option<Vec<ChatMessage>> {
        if text.trim().is_empty() || self.state == SessionState::AwaitingReply {
            return None;
        }
        self.log.push(LogEntry::new(Author::User, text));
        self.state = SessionState::AwaitingReply;
        Some(self.outbound())
    }

    /// Resolves the in-flight call: appends exactly one bot entry (reply or
    /// apology) and returns the session to idle.
    pub fn resolve(&mut self, outcome: ReplyOutcome) {
        let content = match outcome {
            ReplyOutcome::Reply(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    EMPTY_REPLY_FALLBACK.to_string()
                } else {
                    text
                }
            }
            ReplyOutcome::Failed(message) => {
                format!("Sorry — I couldn't respond right now. ({})", message)
            }
        };
        self.log.push(LogEntry::new(Author::Bot, content));
        self.state = SessionState::Idle;
    }

    fn outbound(&self) -> Vec<ChatMessage> {
        self.log
            .iter()
            .map(|entry| ChatMessage {
                role: match entry.author {
                    Author::User => Role::User,
                    Author::Bot => Role::Model,
                },
                content: entry.content.clone(),
            })
            .collect()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

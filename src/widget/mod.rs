pub mod session;
pub mod transport;

use session::{ChatSession, LogEntry, ReplyOutcome, SessionState};
use transport::ChatTransport;

/// Couples a [`ChatSession`] to a [`ChatTransport`]: one user turn in, one
/// bot entry out, success or failure.
pub struct ChatWidget<T: ChatTransport> {
    session: ChatSession,
    transport: T,
}

impl<T: ChatTransport> ChatWidget<T> {
    pub fn new(transport: T) -> Self {
        Self {
            session: ChatSession::new(),
            transport,
        }
    }

    pub fn log(&self) -> &[LogEntry] {
        self.session.log()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Sends one user turn through the proxy. Returns false when the
    /// submission was dropped (blank, or a reply already in flight); on
    /// acceptance the log has grown by the user entry plus exactly one bot
    /// entry by the time this returns.
    pub async fn send(&mut self, text: &str) -> bool {
        let Some(outbound) = self.session.submit(text) else {
            return false;
        };
        let outcome = match self.transport.send(outbound).await {
            Ok(reply) => ReplyOutcome::Reply(reply),
            Err(e) => ReplyOutcome::Failed(e.to_string()),
        };
        self.session.resolve(outcome);
        true
    }
}

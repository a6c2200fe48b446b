//! Chat session, turn, and transcript types for Medibot.
//!
//! A session groups the turns of one conversation. A turn is one user
//! message paired with the generated answer. A transcript is the in-memory,
//! role-tagged replay of a session's turns used to build prompt context.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

/// Maximum number of characters taken from the first message for a title.
pub const TITLE_MAX_CHARS: usize = 100;

/// Title shown for sessions that have none yet.
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// A chat session owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create a new, empty session for a user.
    pub fn new(user_id: Uuid, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            title,
            created_at: now,
            updated_at: now,
        }
    }

    /// The title to display, falling back to "New Chat".
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_SESSION_TITLE)
    }
}

/// One user message and the response generated for it. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(session_id: Uuid, user_id: Uuid, message: String, response: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id,
            user_id,
            message,
            response,
            created_at: Utc::now(),
        }
    }
}

/// Wire shape of a session in list/detail responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of turns in the session.
    pub message_count: u32,
}

impl SessionSummary {
    pub fn new(session: &ChatSession, message_count: u32) -> Self {
        Self {
            id: session.id,
            title: session.display_title().to_string(),
            created_at: session.created_at,
            updated_at: session.updated_at,
            message_count,
        }
    }
}

/// Wire shape of a turn in session detail responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnView {
    pub id: Uuid,
    pub message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Turn> for TurnView {
    fn from(turn: &Turn) -> Self {
        Self {
            id: turn.id,
            message: turn.message.clone(),
            response: turn.response.clone(),
            timestamp: turn.created_at,
        }
    }
}

/// A session together with its turns in chronological order.
#[derive(Debug, Clone)]
pub struct SessionDetail {
    pub session: ChatSession,
    pub turns: Vec<Turn>,
}

impl SessionDetail {
    pub fn summary(&self) -> SessionSummary {
        SessionSummary::new(&self.session, self.turns.len() as u32)
    }

    pub fn turn_views(&self) -> Vec<TurnView> {
        self.turns.iter().map(TurnView::from).collect()
    }
}

/// A role-tagged line of an in-memory transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: MessageRole,
    pub content: String,
}

impl TranscriptMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, alternating user/assistant messages of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<TranscriptMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay persisted turns in order: each contributes a user line then an
    /// assistant line.
    pub fn from_turns(turns: &[Turn]) -> Self {
        let mut transcript = Self {
            messages: Vec::with_capacity(turns.len() * 2),
        };
        for turn in turns {
            transcript.push_exchange(&turn.message, &turn.response);
        }
        transcript
    }

    pub fn push_exchange(&mut self, user_message: &str, response: &str) {
        self.messages.push(TranscriptMessage::user(user_message));
        self.messages.push(TranscriptMessage::assistant(response));
    }

    pub fn messages(&self) -> &[TranscriptMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Cache key for a session's transcript: the owning user plus the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub user_id: Uuid,
    pub session_id: Uuid,
}

impl SessionKey {
    pub fn new(user_id: Uuid, session_id: Uuid) -> Self {
        Self {
            user_id,
            session_id,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.user_id, self.session_id)
    }
}

/// Derive a session title from the first message: its first 100 characters.
///
/// Counts characters, not bytes, so multi-byte input is never split.
pub fn title_from_message(message: &str) -> String {
    message.chars().take(TITLE_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_defaults() {
        let session = ChatSession::new(Uuid::now_v7(), None);
        assert_eq!(session.display_title(), "New Chat");

        let titled = ChatSession::new(Uuid::now_v7(), Some("Fever".to_string()));
        assert_eq!(titled.display_title(), "Fever");
    }

    #[test]
    fn test_transcript_from_turns_alternates() {
        let session_id = Uuid::now_v7();
        let user_id = Uuid::now_v7();
        let turns = vec![
            Turn::new(session_id, user_id, "q1".into(), "a1".into()),
            Turn::new(session_id, user_id, "q2".into(), "a2".into()),
        ];

        let transcript = Transcript::from_turns(&turns);
        let roles: Vec<_> = transcript.messages().iter().map(|m| m.role.clone()).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant
            ]
        );
        assert_eq!(transcript.messages()[3].content, "a2");
    }

    #[test]
    fn test_title_from_message_counts_chars() {
        let long = "é".repeat(150);
        let title = title_from_message(&long);
        assert_eq!(title.chars().count(), 100);

        assert_eq!(title_from_message("short"), "short");
    }

    #[test]
    fn test_session_key_display() {
        let key = SessionKey::new(Uuid::nil(), Uuid::nil());
        assert_eq!(
            key.to_string(),
            "00000000-0000-0000-0000-000000000000_00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_turn_view_serialize() {
        let turn = Turn::new(Uuid::now_v7(), Uuid::now_v7(), "hi".into(), "hello".into());
        let json = serde_json::to_value(TurnView::from(&turn)).unwrap();
        assert_eq!(json["message"], "hi");
        assert_eq!(json["response"], "hello");
        assert!(json.get("timestamp").is_some());
    }
}

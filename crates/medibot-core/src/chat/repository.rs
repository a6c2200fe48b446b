//! ChatRepository trait definition.
//!
//! Provides CRUD operations for chat sessions and their turns.
//! Every session lookup is scoped to its owning user.

use medibot_types::chat::{ChatSession, SessionSummary, Turn};
use medibot_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat session and turn persistence.
///
/// Implementations live in medibot-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Create a new chat session.
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Get a session by ID, only if it belongs to `user_id`.
    fn get_session(
        &self,
        user_id: &Uuid,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// List a user's sessions with turn counts, ordered by `updated_at` DESC.
    fn list_sessions(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<SessionSummary>, RepositoryError>> + Send;

    /// Delete a session and its turns in one transaction.
    ///
    /// Returns `NotFound` if no such session belongs to `user_id`.
    fn delete_session(
        &self,
        user_id: &Uuid,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Persist a turn and bump its session's `updated_at`, atomically.
    ///
    /// An untitled session takes its title from the turn's message in the
    /// same write. Returns `NotFound` if the session no longer exists.
    fn record_turn(
        &self,
        turn: &Turn,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get all turns of a session, oldest first.
    fn get_turns(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Turn>, RepositoryError>> + Send;

    /// Count sessions across all users.
    fn count_sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Count turns across all sessions.
    fn count_all_turns(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}

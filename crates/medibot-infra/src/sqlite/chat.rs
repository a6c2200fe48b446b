//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `medibot-core` using sqlx with split read/write pools.
//! Follows the same patterns as `SqliteUserRepository`: raw queries, private Row structs,
//! split reader/writer pool usage. Multi-statement writes run in a writer transaction.

use medibot_core::chat::repository::ChatRepository;
use medibot_types::chat::{ChatSession, SessionSummary, Turn, title_from_message};
use medibot_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, insert_error, parse_datetime, parse_uuid, query_error};

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain ChatSession.
struct ChatSessionRow {
    id: String,
    user_id: String,
    title: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        Ok(ChatSession {
            id: parse_uuid(&self.id, "session id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain Turn.
struct TurnRow {
    id: String,
    session_id: String,
    user_id: String,
    message: String,
    response: String,
    created_at: String,
}

impl TurnRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            user_id: row.try_get("user_id")?,
            message: row.try_get("message")?,
            response: row.try_get("response")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_turn(self) -> Result<Turn, RepositoryError> {
        Ok(Turn {
            id: parse_uuid(&self.id, "turn id")?,
            session_id: parse_uuid(&self.session_id, "session_id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            message: self.message,
            response: self.response,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_sessions (id, user_id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(&session.title)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(insert_error)?;

        Ok(session.clone())
    }

    async fn get_session(
        &self,
        user_id: &Uuid,
        session_id: &Uuid,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ? AND user_id = ?")
            .bind(session_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row).map_err(query_error)?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn list_sessions(&self, user_id: &Uuid) -> Result<Vec<SessionSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT s.*,
                      (SELECT COUNT(*) FROM chat_turns t WHERE t.session_id = s.id) AS turn_count
               FROM chat_sessions s
               WHERE s.user_id = ?
               ORDER BY s.updated_at DESC, s.id DESC"#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let count: i64 = row.try_get("turn_count").map_err(query_error)?;
            let session = ChatSessionRow::from_row(row)
                .map_err(query_error)?
                .into_session()?;
            sessions.push(SessionSummary::new(&session, count as u32));
        }

        Ok(sessions)
    }

    async fn delete_session(&self, user_id: &Uuid, session_id: &Uuid) -> Result<(), RepositoryError> {
        let session_id = session_id.to_string();
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let owned = sqlx::query("SELECT 1 FROM chat_sessions WHERE id = ? AND user_id = ?")
            .bind(&session_id)
            .bind(user_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?;
        if owned.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM chat_turns WHERE session_id = ?")
            .bind(&session_id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        sqlx::query("DELETE FROM chat_sessions WHERE id = ?")
            .bind(&session_id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn record_turn(&self, turn: &Turn) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        sqlx::query(
            r#"INSERT INTO chat_turns (id, session_id, user_id, message, response, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(turn.id.to_string())
        .bind(turn.session_id.to_string())
        .bind(turn.user_id.to_string())
        .bind(&turn.message)
        .bind(&turn.response)
        .bind(format_datetime(&turn.created_at))
        .execute(&mut *tx)
        .await
        .map_err(insert_error)?;

        let result = sqlx::query(
            "UPDATE chat_sessions SET updated_at = ?, title = COALESCE(title, ?) WHERE id = ?",
        )
        .bind(format_datetime(&turn.created_at))
        .bind(title_from_message(&turn.message))
        .bind(turn.session_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn get_turns(&self, session_id: &Uuid) -> Result<Vec<Turn>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_turns WHERE session_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut turns = Vec::with_capacity(rows.len());
        for row in &rows {
            let turn_row = TurnRow::from_row(row).map_err(query_error)?;
            turns.push(turn_row.into_turn()?);
        }

        Ok(turns)
    }

    async fn count_sessions(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM chat_sessions")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let count: i64 = row.try_get("cnt").map_err(query_error)?;
        Ok(count as u64)
    }

    async fn count_all_turns(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM chat_turns")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let count: i64 = row.try_get("cnt").map_err(query_error)?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use medibot_core::repository::user::UserRepository;
    use medibot_types::user::{ExternalIdentity, User};

    use crate::sqlite::pool::default_database_url;
    use crate::sqlite::user::SqliteUserRepository;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let url = default_database_url(dir.path());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    /// Insert a user (needed for the session foreign key).
    async fn make_user(pool: &DatabasePool, subject: &str) -> User {
        let user = User::from_identity(&ExternalIdentity {
            subject: subject.to_string(),
            email: format!("{subject}@example.com"),
            name: subject.to_string(),
            avatar_url: None,
        });
        SqliteUserRepository::new(pool.clone())
            .create(&user)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_session_scoped_by_user() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let owner = make_user(&pool, "owner").await;
        let stranger = make_user(&pool, "stranger").await;

        let session = repo
            .create_session(&ChatSession::new(owner.id, Some("Fever".to_string())))
            .await
            .unwrap();

        let fetched = repo.get_session(&owner.id, &session.id).await.unwrap().unwrap();
        assert_eq!(fetched.title.as_deref(), Some("Fever"));
        assert_eq!(fetched.user_id, owner.id);
        assert!(repo.get_session(&stranger.id, &session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_requires_existing_user() {
        let repo = SqliteChatRepository::new(test_pool().await);
        let err = repo
            .create_session(&ChatSession::new(Uuid::now_v7(), None))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));
    }

    #[tokio::test]
    async fn test_turns_are_chronological() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let user = make_user(&pool, "u").await;
        let session = repo.create_session(&ChatSession::new(user.id, None)).await.unwrap();

        let base = Utc::now();
        for (i, offset) in [2, 0, 1].into_iter().enumerate() {
            let mut turn = Turn::new(session.id, user.id, format!("q{offset}"), format!("a{i}"));
            turn.created_at = base + Duration::seconds(offset);
            repo.record_turn(&turn).await.unwrap();
        }

        let turns = repo.get_turns(&session.id).await.unwrap();
        let messages: Vec<_> = turns.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["q0", "q1", "q2"]);
    }

    #[tokio::test]
    async fn test_record_turn_bumps_updated_at_and_list_order() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let user = make_user(&pool, "u").await;

        let older = repo.create_session(&ChatSession::new(user.id, None)).await.unwrap();
        let newer = repo
            .create_session(&ChatSession::new(user.id, Some("Newer".to_string())))
            .await
            .unwrap();

        let listed = repo.list_sessions(&user.id).await.unwrap();
        assert_eq!(listed[0].id, newer.id);

        let mut turn = Turn::new(older.id, user.id, "q".into(), "a".into());
        turn.created_at = Utc::now() + Duration::seconds(5);
        repo.record_turn(&turn).await.unwrap();

        let listed = repo.list_sessions(&user.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, older.id);
        assert_eq!(listed[0].title, "q");
        assert_eq!(listed[0].message_count, 1);
        assert_eq!(listed[1].message_count, 0);
    }

    #[tokio::test]
    async fn test_first_turn_titles_untitled_session() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let user = make_user(&pool, "u").await;
        let session = repo.create_session(&ChatSession::new(user.id, None)).await.unwrap();

        repo.record_turn(&Turn::new(session.id, user.id, "Migraine".into(), "a".into()))
            .await
            .unwrap();
        repo.record_turn(&Turn::new(session.id, user.id, "Still there".into(), "b".into()))
            .await
            .unwrap();

        let fetched = repo.get_session(&user.id, &session.id).await.unwrap().unwrap();
        assert_eq!(fetched.title.as_deref(), Some("Migraine"));
        assert!(fetched.updated_at >= session.updated_at);
    }

    #[tokio::test]
    async fn test_record_turn_for_missing_session_writes_nothing() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let user = make_user(&pool, "u").await;

        let err = repo
            .record_turn(&Turn::new(Uuid::now_v7(), user.id, "q".into(), "a".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert_eq!(repo.count_all_turns().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_session_removes_turns() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let user = make_user(&pool, "u").await;
        let session = repo.create_session(&ChatSession::new(user.id, None)).await.unwrap();
        repo.record_turn(&Turn::new(session.id, user.id, "q".into(), "a".into()))
            .await
            .unwrap();

        repo.delete_session(&user.id, &session.id).await.unwrap();

        assert!(repo.get_session(&user.id, &session.id).await.unwrap().is_none());
        assert!(repo.get_turns(&session.id).await.unwrap().is_empty());
        assert_eq!(repo.count_all_turns().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_foreign_session_not_found() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let owner = make_user(&pool, "owner").await;
        let stranger = make_user(&pool, "stranger").await;
        let session = repo.create_session(&ChatSession::new(owner.id, None)).await.unwrap();

        let err = repo.delete_session(&stranger.id, &session.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert_eq!(repo.count_sessions().await.unwrap(), 1);
    }
}

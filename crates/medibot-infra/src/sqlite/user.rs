//! SQLite user repository implementation.
//!
//! Implements `UserRepository` from `medibot-core`: raw queries, a private
//! Row struct, reads on the reader pool and writes on the writer pool.

use medibot_core::repository::user::UserRepository;
use medibot_types::error::RepositoryError;
use medibot_types::user::User;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, insert_error, parse_datetime, parse_uuid, query_error};

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: String) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT * FROM users WHERE {column} = ?");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let user_row = UserRow::from_row(&row).map_err(query_error)?;
                Ok(Some(user_row.into_user()?))
            }
            None => Ok(None),
        }
    }
}

/// Internal row type for mapping SQLite rows to domain User.
struct UserRow {
    id: String,
    external_id: String,
    email: String,
    name: String,
    avatar_url: Option<String>,
    created_at: String,
    last_login_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            external_id: row.try_get("external_id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            avatar_url: row.try_get("avatar_url")?,
            created_at: row.try_get("created_at")?,
            last_login_at: row.try_get("last_login_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        Ok(User {
            id: parse_uuid(&self.id, "user id")?,
            external_id: self.external_id,
            email: self.email,
            name: self.name,
            avatar_url: self.avatar_url,
            created_at: parse_datetime(&self.created_at)?,
            last_login_at: parse_datetime(&self.last_login_at)?,
        })
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &User) -> Result<User, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO users (id, external_id, email, name, avatar_url, created_at, last_login_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(user.id.to_string())
        .bind(&user.external_id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.avatar_url)
        .bind(format_datetime(&user.created_at))
        .bind(format_datetime(&user.last_login_at))
        .execute(&self.pool.writer)
        .await
        .map_err(insert_error)?;

        Ok(user.clone())
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<User>, RepositoryError> {
        self.fetch_one_by("id", id.to_string()).await
    }

    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<User>, RepositoryError> {
        self.fetch_one_by("external_id", external_id.to_string()).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.fetch_one_by("email", email.to_string()).await
    }

    async fn update(&self, user: &User) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE users
               SET email = ?, name = ?, avatar_url = ?, last_login_at = ?
               WHERE id = ?"#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.avatar_url)
        .bind(format_datetime(&user.last_login_at))
        .bind(user.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(insert_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), RepositoryError> {
        let id = id.to_string();
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        sqlx::query("DELETE FROM chat_turns WHERE user_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        sqlx::query("DELETE FROM chat_sessions WHERE user_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM users")
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
    use crate::sqlite::chat::SqliteChatRepository;
    use crate::sqlite::pool::{DatabasePool, default_database_url};
    use medibot_core::chat::repository::ChatRepository;
    use medibot_types::chat::{ChatSession, Turn};
    use medibot_types::user::ExternalIdentity;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let url = default_database_url(dir.path());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn make_user(subject: &str, email: &str) -> User {
        User::from_identity(&ExternalIdentity {
            subject: subject.to_string(),
            email: email.to_string(),
            name: "Test User".to_string(),
            avatar_url: None,
        })
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let user = make_user("sub-1", "one@example.com");
        repo.create(&user).await.unwrap();

        let by_id = repo.get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.external_id, user.external_id);
        assert_eq!(by_id.name, user.name);
        assert_eq!(by_id.avatar_url, None);
        let by_sub = repo.get_by_external_id("sub-1").await.unwrap().unwrap();
        assert_eq!(by_sub.id, user.id);
        let by_email = repo.get_by_email("one@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(repo.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.create(&make_user("sub-1", "dup@example.com")).await.unwrap();

        let err = repo
            .create(&make_user("sub-2", "dup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let mut user = make_user("sub-1", "old@example.com");
        repo.create(&user).await.unwrap();

        user.email = "new@example.com".to_string();
        user.avatar_url = Some("https://img/a.png".to_string());
        repo.update(&user).await.unwrap();

        let fetched = repo.get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "new@example.com");
        assert_eq!(fetched.avatar_url.as_deref(), Some("https://img/a.png"));
    }

    #[tokio::test]
    async fn test_update_missing_user_not_found() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let err = repo.update(&make_user("ghost", "ghost@example.com")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_cascades_sessions_and_turns() {
        let pool = test_pool().await;
        let users = SqliteUserRepository::new(pool.clone());
        let chats = SqliteChatRepository::new(pool);

        let user = make_user("sub-1", "one@example.com");
        users.create(&user).await.unwrap();
        let other = make_user("sub-2", "two@example.com");
        users.create(&other).await.unwrap();

        let session = chats.create_session(&ChatSession::new(user.id, None)).await.unwrap();
        chats
            .record_turn(&Turn::new(session.id, user.id, "q".into(), "a".into()))
            .await
            .unwrap();
        let kept = chats.create_session(&ChatSession::new(other.id, None)).await.unwrap();

        users.delete(&user.id).await.unwrap();

        assert!(users.get_by_id(&user.id).await.unwrap().is_none());
        assert_eq!(users.count().await.unwrap(), 1);
        assert_eq!(chats.count_sessions().await.unwrap(), 1);
        assert_eq!(chats.count_all_turns().await.unwrap(), 0);
        assert!(chats.get_session(&other.id, &kept.id).await.unwrap().is_some());

        let err = users.delete(&user.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}

//! Identity resolution and local user upsert.
//!
//! An `IdentityProvider` turns an authorization code into a verified
//! `ExternalIdentity`; `IdentityService` maps that identity onto a local
//! `User`, creating it on first login and refreshing it afterwards.

use medibot_types::error::{AuthError, RepositoryError};
use medibot_types::user::{ExternalIdentity, User};
use tracing::info;
use uuid::Uuid;

use crate::repository::user::UserRepository;

/// An OAuth 2.0 authorization-code identity provider.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in medibot-infra (e.g., `GoogleIdentityProvider`).
pub trait IdentityProvider: Send + Sync {
    /// Provider name (e.g., "google").
    fn name(&self) -> &str;

    /// URL the browser is sent to, carrying the CSRF `state`.
    fn authorize_url(&self, state: &str) -> Result<String, AuthError>;

    /// Exchange `code` for tokens and fetch the verified identity.
    fn resolve(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<ExternalIdentity, AuthError>> + Send;
}

/// Maps external identities onto local user accounts.
pub struct IdentityService<U: UserRepository> {
    user_repo: U,
}

impl<U: UserRepository> IdentityService<U> {
    pub fn new(user_repo: U) -> Self {
        Self { user_repo }
    }

    pub fn user_repo(&self) -> &U {
        &self.user_repo
    }

    /// Create or refresh the local user for `identity` and record the login.
    ///
    /// Matching is by the provider subject. Email, name and login time are
    /// always refreshed; the avatar only when the provider sent one.
    #[tracing::instrument(skip_all, fields(subject = %identity.subject))]
    pub async fn upsert(&self, identity: &ExternalIdentity) -> Result<User, AuthError> {
        if identity.subject.trim().is_empty() {
            return Err(AuthError::MissingField("sub"));
        }
        if identity.email.trim().is_empty() {
            return Err(AuthError::MissingField("email"));
        }

        match self.user_repo.get_by_external_id(&identity.subject).await? {
            Some(mut user) => {
                user.refresh_from(identity);
                self.user_repo.update(&user).await?;
                info!(user_id = %user.id, "User logged in");
                Ok(user)
            }
            None => {
                let user = self.user_repo.create(&User::from_identity(identity)).await?;
                info!(user_id = %user.id, "User created on first login");
                Ok(user)
            }
        }
    }

    /// Look up the user a session token refers to.
    pub async fn get_user(&self, user_id: &Uuid) -> Result<Option<User>, RepositoryError> {
        self.user_repo.get_by_id(user_id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.user_repo.get_by_email(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockUserRepo {
        users: Mutex<Vec<User>>,
    }

    impl UserRepository for MockUserRepo {
        async fn create(&self, user: &User) -> Result<User, RepositoryError> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == user.email) {
                return Err(RepositoryError::Conflict("email".to_string()));
            }
            users.push(user.clone());
            Ok(user.clone())
        }

        async fn get_by_id(&self, id: &Uuid) -> Result<Option<User>, RepositoryError> {
            Ok(self.users.lock().unwrap().iter().find(|u| u.id == *id).cloned())
        }

        async fn get_by_external_id(&self, external_id: &str) -> Result<Option<User>, RepositoryError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.external_id == external_id)
                .cloned())
        }

        async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
            Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
        }

        async fn update(&self, user: &User) -> Result<(), RepositoryError> {
            let mut users = self.users.lock().unwrap();
            let slot = users
                .iter_mut()
                .find(|u| u.id == user.id)
                .ok_or(RepositoryError::NotFound)?;
            *slot = user.clone();
            Ok(())
        }

        async fn delete(&self, id: &Uuid) -> Result<(), RepositoryError> {
            let mut users = self.users.lock().unwrap();
            let before = users.len();
            users.retain(|u| u.id != *id);
            if users.len() == before {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        }

        async fn count(&self) -> Result<u64, RepositoryError> {
            Ok(self.users.lock().unwrap().len() as u64)
        }
    }

    fn identity(email: &str, avatar: Option<&str>) -> ExternalIdentity {
        ExternalIdentity {
            subject: "google-123".to_string(),
            email: email.to_string(),
            name: "Grace".to_string(),
            avatar_url: avatar.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn first_login_creates_user() {
        let service = IdentityService::new(MockUserRepo::default());
        let user = service.upsert(&identity("grace@example.com", None)).await.unwrap();

        assert_eq!(user.external_id, "google-123");
        assert_eq!(service.user_repo().count().await.unwrap(), 1);
        assert_eq!(service.get_user(&user.id).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn repeat_login_refreshes_profile_and_keeps_avatar() {
        let service = IdentityService::new(MockUserRepo::default());
        let first = service
            .upsert(&identity("grace@example.com", Some("https://img/1.png")))
            .await
            .unwrap();

        let second = service.upsert(&identity("grace@navy.mil", None)).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.email, "grace@navy.mil");
        assert_eq!(second.avatar_url.as_deref(), Some("https://img/1.png"));
        assert!(second.last_login_at >= first.last_login_at);
        assert_eq!(service.user_repo().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_email_is_rejected() {
        let service = IdentityService::new(MockUserRepo::default());
        let err = service.upsert(&identity("", None)).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingField("email")));
    }
}

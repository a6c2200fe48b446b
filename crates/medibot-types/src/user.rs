//! User and external identity types.
//!
//! A `User` is the local record created the first time an identity provider
//! vouches for someone. `ExternalIdentity` is what the provider hands back
//! after the authorization-code exchange.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A locally persisted user account.
///
/// `external_id` (the provider's subject claim) and `email` are both unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

/// Verified identity returned by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    /// Provider-scoped subject identifier (`sub` claim).
    pub subject: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl User {
    /// Build a brand-new user record from a freshly resolved identity.
    pub fn from_identity(identity: &ExternalIdentity) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            external_id: identity.subject.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            avatar_url: identity.avatar_url.clone(),
            created_at: now,
            last_login_at: now,
        }
    }

    /// Refresh profile fields from a newer identity and bump `last_login_at`.
    ///
    /// The avatar is only replaced when the provider actually sent one.
    pub fn refresh_from(&mut self, identity: &ExternalIdentity) {
        self.email = identity.email.clone();
        self.name = identity.name.clone();
        if identity.avatar_url.is_some() {
            self.avatar_url = identity.avatar_url.clone();
        }
        self.last_login_at = Utc::now();
    }
}

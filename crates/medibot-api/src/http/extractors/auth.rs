//! Session authentication extractor.
//!
//! Resolves the signed-in user from:
//! - `Authorization: Bearer <token>` header
//! - the `medibot_session` cookie
//!
//! Tokens are verified with the server's signing key and the user is loaded
//! from the `users` table. Requiring `CurrentUser` makes a route sign-in only;
//! `Option<CurrentUser>` lets a page render for both cases.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;

use medibot_types::error::AuthError;
use medibot_types::user::User;

use crate::http::error::AppError;
use crate::http::session::session_token;
use crate::state::AppState;

/// The authenticated user for this request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<User, AppError> {
    let token = session_token(&parts.headers).ok_or(AuthError::Unauthenticated)?;
    let user_id = state.session_tokens.verify(&token)?;

    state
        .identity_service
        .get_user(&user_id)
        .await?
        .ok_or(AppError::Auth(AuthError::Unauthenticated))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state).await.map(CurrentUser)
    }
}

impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match resolve_user(parts, state).await {
            Ok(user) => Ok(Some(CurrentUser(user))),
            Err(AppError::Auth(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

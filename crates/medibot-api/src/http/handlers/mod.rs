//! HTTP request handlers.

pub mod auth;
pub mod chat;
pub mod legacy;
pub mod pages;
pub mod session;

use uuid::Uuid;

use crate::http::error::AppError;

/// Parse a session id from a path or body value, returning a 400 error on invalid format.
pub(crate) fn parse_session_id(s: &str) -> Result<Uuid, AppError> {
    s.trim()
        .parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid session id: {s}")))
}

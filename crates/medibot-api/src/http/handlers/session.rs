//! Chat session HTTP handlers.
//!
//! Endpoints:
//! - POST   /api/chat/session/new         - Create an empty session
//! - GET    /api/chat/sessions            - List the user's sessions, most recent first
//! - GET    /api/chat/session/{id}        - Get a session with its turns
//! - POST   /api/chat/session/{id}/load   - Rebuild the session's memory from storage
//! - DELETE /api/chat/session/{id}/delete - Delete a session and its turns

use std::time::Instant;

use axum::extract::{Path, State};
use serde::Serialize;
use uuid::Uuid;

use medibot_types::chat::{SessionDetail, SessionSummary, TurnView};

use super::parse_session_id;
use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::{ApiResponse, Empty};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NewSessionPayload {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SessionListPayload {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct SessionPayload {
    pub session: SessionSummary,
    pub chats: Vec<TurnView>,
}

impl From<SessionDetail> for SessionPayload {
    fn from(detail: SessionDetail) -> Self {
        Self {
            session: detail.summary(),
            chats: detail.turn_views(),
        }
    }
}

/// POST /api/chat/session/new - Create an empty session.
pub async fn new_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<NewSessionPayload>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let session = state.chat_service.create_session(user.id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(
        NewSessionPayload {
            session_id: session.id,
        },
        request_id,
        elapsed,
    ))
}

/// GET /api/chat/sessions - List the user's sessions.
pub async fn list_sessions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<SessionListPayload>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sessions = state.chat_service.list_sessions(user.id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(
        SessionListPayload { sessions },
        request_id,
        elapsed,
    ))
}

/// GET /api/chat/session/{id} - Get a session with its turns.
pub async fn get_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<SessionPayload>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_session_id(&session_id)?;
    let detail = state.chat_service.get_session(user.id, sid).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(detail.into(), request_id, elapsed))
}

/// POST /api/chat/session/{id}/load - Make this the active session.
///
/// Rebuilds the in-memory transcript from storage and returns the session.
pub async fn load_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<SessionPayload>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_session_id(&session_id)?;
    let detail = state.chat_service.load_session(user.id, sid).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(detail.into(), request_id, elapsed))
}

/// DELETE /api/chat/session/{id}/delete - Delete a session and its turns.
pub async fn delete_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<Empty>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_session_id(&session_id)?;
    state.chat_service.delete_session(user.id, sid).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(Empty::new(), request_id, elapsed))
}

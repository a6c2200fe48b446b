//! Chat message handler.
//!
//! Endpoint:
//! - POST /api/chat - Send a message, get the answer and the session it landed in

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use medibot_core::chat::service::ChatReply;

use super::parse_session_id;
use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for POST /api/chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub msg: String,
    /// Continue this session; a new one is created when absent.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /api/chat - Answer a message in the context of its session.
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ChatRequest>,
) -> Result<ApiResponse<ChatReply>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let session_id = body
        .session_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .map(parse_session_id)
        .transpose()?;

    let reply = state
        .chat_service
        .send_message(user.id, &body.msg, session_id)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    tracing::info!(
        user_id = %user.id,
        session_id = %reply.session_id,
        elapsed_ms = elapsed,
        "Chat turn completed"
    );
    Ok(ApiResponse::success(reply, request_id, elapsed))
}

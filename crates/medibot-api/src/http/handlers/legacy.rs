//! Legacy single-shot endpoint.
//!
//! Endpoint:
//! - GET|POST /get - Form field `msg` in, plain-text answer out. No history;
//!   every call is recorded in its own throwaway session.

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use medibot_types::error::ChatError;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LegacyForm {
    #[serde(default)]
    pub msg: String,
}

/// GET|POST /get - Answer `msg` as plain text.
pub async fn get_answer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<LegacyForm>,
) -> Response {
    match state.chat_service.legacy_chat(user.id, &form.msg).await {
        Ok(answer) => answer.into_response(),
        Err(ChatError::EmptyMessage) => {
            (StatusCode::BAD_REQUEST, ChatError::EmptyMessage.to_string()).into_response()
        }
        Err(e) => {
            let app_error = AppError::from(e);
            let (status, _, message) = app_error.parts().unwrap_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                String::new(),
            ));
            tracing::error!(error = %message, "Legacy chat failed");
            (status, format!("Error: {message}")).into_response()
        }
    }
}

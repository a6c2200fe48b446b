//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;

use medibot_types::error::{AuthError, ChatError, RepositoryError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat workflow errors.
    Chat(ChatError),
    /// Authentication failure. Always answered with a redirect to the login page.
    Auth(AuthError),
    /// Storage errors outside the chat workflow.
    Repository(RepositoryError),
    /// Validation error.
    Validation(String),

}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl AppError {
    /// Status, machine-readable code and message. `None` for auth failures.
    pub fn parts(&self) -> Option<(StatusCode, &'static str, String)> {
        let parts = match self {
            AppError::Chat(ChatError::EmptyMessage) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", ChatError::EmptyMessage.to_string())
            }
            AppError::Chat(ChatError::SessionNotFound) => {
                (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", ChatError::SessionNotFound.to_string())
            }
            AppError::Chat(ChatError::Repository(e)) | AppError::Repository(e) => match e {
                RepositoryError::NotFound => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", "Not found".to_string())
                }
                RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                other => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", other.to_string()),
            },
            AppError::Chat(ChatError::Generation(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "GENERATION_ERROR", e.to_string())
            }
            AppError::Auth(_) => return None,
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        };
        Some(parts)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let Some((status, code, message)) = self.parts() else {
            if let AppError::Auth(e) = &self {
                tracing::debug!(error = %e, "Unauthenticated request, redirecting to login");
            }
            return Redirect::to("/login").into_response();
        };

        if status.is_server_error() {
            tracing::error!(code, error = %message, "Request failed");
        }

        let body = json!({
            "success": false,
            "error": message,
            "code": code,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            }
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

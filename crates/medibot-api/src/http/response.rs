//! Envelope response format for JSON API responses.
//!
//! Every response is wrapped in a consistent envelope, with the payload's
//! fields inlined next to `success`:
//! ```json
//! {
//!   "success": true,
//!   "session_id": "...",
//!   "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 }
//! }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Envelope response wrapping a payload struct.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,

    /// Payload fields, flattened into the envelope.
    #[serde(flatten)]
    pub payload: T,

    /// Request metadata.
    pub meta: ApiMeta,
}

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ApiMeta {
    /// Unique request identifier for tracing.
    pub request_id: String,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
    /// Response time in milliseconds.
    pub response_time_ms: u64,
}

/// Payload for responses that carry nothing but `success`.
pub type Empty = serde_json::Map<String, serde_json::Value>;

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub fn success(payload: T, request_id: String, response_time_ms: u64) -> Self {
        Self {
            success: true,
            payload,
            meta: ApiMeta {
                request_id,
                timestamp: chrono::Utc::now().to_rfc3339(),
                response_time_ms,
            },
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = serde_json::to_string(&self).unwrap_or_else(|_| {
            r#"{"success":false,"error":"Failed to serialize response","code":"SERIALIZATION_ERROR"}"#
                .to_string()
        });

        let status = if self.success {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        session_id: &'static str,
    }

    #[test]
    fn payload_fields_are_inlined() {
        let resp = ApiResponse::success(Payload { session_id: "abc" }, "req-1".to_string(), 4);
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["session_id"], "abc");
        assert_eq!(json["meta"]["request_id"], "req-1");
        assert_eq!(json["meta"]["response_time_ms"], 4);
    }

    #[test]
    fn empty_payload_has_only_envelope() {
        let resp = ApiResponse::success(Empty::new(), "req-2".to_string(), 0);
        let json = serde_json::to_value(&resp).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"success".to_string()));
        assert!(keys.contains(&"meta".to_string()));
    }
}

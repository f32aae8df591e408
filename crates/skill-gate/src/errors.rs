//! Skill Gate error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl. Messages
//! returned to clients are generic so they cannot be used to probe the
//! verification pipeline. Actual reasons are logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// HTTP-facing error type.
///
/// Maps to status codes:
/// - RequestRejected: 400 Bad Request
/// - ShuttingDown: 503 Service Unavailable
#[derive(Debug, Error)]
pub enum GateError {
    /// The request failed platform verification (signature, certificate,
    /// timestamp). The reason is logged, never returned.
    #[error("Request rejected: {0}")]
    RequestRejected(String),

    /// The process is draining and no longer starts outbound fetches.
    #[error("Service is shutting down")]
    ShuttingDown,
}

impl GateError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            GateError::RequestRejected(_) => 400,
            GateError::ShuttingDown => 503,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            GateError::RequestRejected(reason) => {
                // Log actual reason server-side, return generic message to client
                tracing::warn!(target: "gate.handler", reason = %reason, "Request rejected");
                (
                    StatusCode::BAD_REQUEST,
                    "REQUEST_REJECTED",
                    "The request could not be verified".to_string(),
                )
            }
            GateError::ShuttingDown => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Service temporarily unavailable".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_display() {
        assert_eq!(
            GateError::RequestRejected("bad signature".to_string()).to_string(),
            "Request rejected: bad signature"
        );
        assert_eq!(
            GateError::ShuttingDown.to_string(),
            "Service is shutting down"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GateError::RequestRejected("test".to_string()).status_code(),
            400
        );
        assert_eq!(GateError::ShuttingDown.status_code(), 503);
    }

    #[tokio::test]
    async fn test_into_response_rejected_hides_reason() {
        let error = GateError::RequestRejected("certificate expired".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "REQUEST_REJECTED");
        assert_eq!(
            body_json["error"]["message"],
            "The request could not be verified"
        );
        assert!(!body_json.to_string().contains("expired"));
    }

    #[tokio::test]
    async fn test_into_response_shutting_down() {
        let response = GateError::ShuttingDown.into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "SERVICE_UNAVAILABLE");
    }
}

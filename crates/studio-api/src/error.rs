//! # API Error Types
//!
//! Errors raised by the HTTP layer itself, rendered as
//! `{"error": {"code", "message"}}`. Relay outcomes (including 4xx/5xx
//! relayed from the remote endpoint) are not errors at this level; they
//! pass through with the relay's own body.
//!
//! Internal error details are logged and never returned to the client.

use std::error::Error as _;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use studio_relay::RelayFault;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code, e.g. `NOT_FOUND`.
    pub code: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// No procedure at the requested path (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The request cannot be served as asked (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Anything unexpected (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    pub fn procedure_not_found(path: &str) -> Self {
        Self::NotFound(format!("no procedure at `{path}`"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<RelayFault> for AppError {
    fn from(fault: RelayFault) -> Self {
        let mut message = fault.to_string();
        let mut source = fault.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Internal(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use studio_relay::RemoteError;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            AppError::NotFound("x".into()).status_and_code(),
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        );
        assert_eq!(
            AppError::BadRequest("x".into()).status_and_code(),
            (StatusCode::BAD_REQUEST, "BAD_REQUEST")
        );
        assert_eq!(
            AppError::Internal("x".into()).status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        );
    }

    #[tokio::test]
    async fn not_found_names_the_path() {
        let (status, body) = response_parts(AppError::procedure_not_found("user.byId")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.code, "NOT_FOUND");
        assert!(body.error.message.contains("user.byId"));
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, body) = response_parts(AppError::Internal("socket exploded".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "An internal error occurred");
    }

    #[test]
    fn relay_fault_keeps_its_cause_chain() {
        let fault = RelayFault::Remote {
            path: "p".into(),
            source: RemoteError::Protocol {
                url: "http://x/p".into(),
                reason: "not tRPC".into(),
            },
        };
        match AppError::from(fault) {
            AppError::Internal(message) => {
                assert!(message.contains("`p`"), "{message}");
                assert!(message.contains("not tRPC"), "{message}");
            }
            other => panic!("expected Internal, got {other:?}"),
        }
    }
}

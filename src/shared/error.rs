//! Application Error Types
//!
//! Relay-internal failures ([`RelayError`]) never leave the connection they
//! happen on. Handshake failures ([`AppError`]) are the only errors a client
//! ever sees, rendered as an HTTP response before the upgrade.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::{IdentityError, RoomNameError};

/// Failures on the relay data path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Malformed inbound frame. The frame is dropped.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Recipient queue saturated.
    #[error("outbound queue full")]
    QueueFull,

    /// Operation on a connection that has already begun closing.
    #[error("connection closed")]
    Closed,

    /// I/O failure on the socket. Fatal to that connection only.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Handshake-time error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        AppError::Unauthorized(err.to_string())
    }
}

impl From<RoomNameError> for AppError {
    fn from(err: RoomNameError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, 10002, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, 10003, msg.clone()),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, 10008, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, 10000, "Internal server error".into())
            }
        };

        let body = ErrorResponse { code, message };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_collaborator_errors_map_to_client_errors() {
        assert!(matches!(
            AppError::from(IdentityError::Expired),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            AppError::from(RoomNameError::Empty),
            AppError::BadRequest(_)
        ));
    }
}

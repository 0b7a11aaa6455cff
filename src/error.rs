//! Error types for connections, the manager, and the HTTP surface.
//!
//! [`ConnectionError`] describes a failed read, write or close on a single
//! connection. [`ManagerError`] is returned when the manager can no longer
//! accept operations. [`GatewayError`] is the HTTP-facing error; each
//! variant maps to a status code and a structured JSON body.

use std::fmt::Display;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Failure of a single connection operation.
///
/// None of these are escalated to callers of the manager: a failed read or
/// write unregisters the connection, a failed close is logged.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The peer closed the connection or the stream ended.
    #[error("connection closed by peer")]
    Closed,

    /// The underlying transport reported an error.
    #[error("transport error: {0}")]
    Transport(String),

    /// A frame could not be encoded or decoded as a message.
    #[error("malformed message: {0}")]
    Codec(#[from] serde_json::Error),

    /// The operation did not finish within the configured bound.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

impl ConnectionError {
    /// Wraps any displayable transport error.
    pub fn transport(err: impl Display) -> Self {
        Self::Transport(err.to_string())
    }
}

/// The manager is not accepting operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ManagerError {
    /// Shutdown has begun; new registrations are refused.
    #[error("connection manager is shutting down")]
    ShuttingDown,

    /// The actor has stopped and its mailbox is closed.
    #[error("connection manager is not running")]
    Closed,
}

/// Structured JSON error response body.
///
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "websocket upgrade failed: Connection header did not include 'upgrade'"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status                 |
/// |-----------|------------|-----------------------------|
/// | 1000–1999 | Validation | 400 Bad Request             |
/// | 3000–3999 | Server     | 503 Service Unavailable     |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request could not be upgraded to a WebSocket.
    #[error("websocket upgrade failed: {0}")]
    UpgradeFailed(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The connection manager refused the operation.
    #[error("unavailable: {0}")]
    Unavailable(#[from] ManagerError),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::UpgradeFailed(_) => 1001,
            Self::InvalidRequest(_) => 1002,
            Self::Unavailable(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::UpgradeFailed(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

//! System endpoints: health check.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::manager::{ConnectionManager, MessageSink};

/// Upper bound on the connection snapshot taken for `/health`. The
/// snapshot queues behind any write in progress, which may have no
/// timeout of its own.
const HEALTH_SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(2);

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `"healthy"` or `"shutting_down"`.
    pub status: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
    /// Registered connections, absent once the manager has stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<usize>,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp and the number of registered connections.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is shutting down", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let shutting_down = state.manager.is_shutting_down();
    let connections = connection_count(&state.manager, HEALTH_SNAPSHOT_TIMEOUT).await;

    let (code, status) = if shutting_down {
        (StatusCode::SERVICE_UNAVAILABLE, "shutting_down")
    } else {
        (StatusCode::OK, "healthy")
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            connections,
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

/// Number of registered connections, or `None` if the manager has stopped
/// or did not answer within `limit`.
async fn connection_count<W: MessageSink>(
    manager: &ConnectionManager<W>,
    limit: Duration,
) -> Option<usize> {
    match tokio::time::timeout(limit, manager.connections()).await {
        Ok(snapshot) => snapshot.ok().map(|ids| ids.len()),
        Err(_) => {
            tracing::warn!(?limit, "connection snapshot timed out");
            None
        }
    }
}

//! Broadcast and connection listing handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{BroadcastAccepted, BroadcastRequest, ConnectionListResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /broadcast` — Queue a message for every connected client.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a blank message type and
/// [`GatewayError::Unavailable`] if the manager has stopped.
#[utoipa::path(
    post,
    path = "/api/v1/broadcast",
    tag = "Broadcast",
    summary = "Broadcast a message",
    description = "Queues the message for delivery to every WebSocket connection registered when the manager processes it. Returns as soon as the message is queued; delivery is best-effort.",
    request_body = BroadcastRequest,
    responses(
        (status = 202, description = "Message queued", body = BroadcastAccepted),
        (status = 400, description = "Invalid message", body = ErrorResponse),
        (status = 503, description = "Manager not running", body = ErrorResponse),
    )
)]
pub async fn broadcast(
    State(state): State<AppState>,
    Json(req): Json<BroadcastRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let message = req.into_message()?;
    let kind = message.kind.clone();

    state.manager.broadcast(message).await?;
    tracing::debug!(kind = %kind, "broadcast queued via REST");

    Ok((
        StatusCode::ACCEPTED,
        Json(BroadcastAccepted {
            status: "queued".to_string(),
            kind,
            accepted_at: Utc::now(),
        }),
    ))
}

/// `GET /connections` — List registered connections.
///
/// # Errors
///
/// Returns [`GatewayError::Unavailable`] if the manager has stopped.
#[utoipa::path(
    get,
    path = "/api/v1/connections",
    tag = "Broadcast",
    summary = "List connections",
    description = "Returns the ids of all WebSocket connections currently registered with the manager.",
    responses(
        (status = 200, description = "Registered connections", body = ConnectionListResponse),
        (status = 503, description = "Manager not running", body = ErrorResponse),
    )
)]
pub async fn list_connections(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let connection_ids = state.manager.connections().await?;
    Ok(Json(ConnectionListResponse {
        count: connection_ids.len(),
        connection_ids,
    }))
}

/// Broadcast routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/broadcast", post(broadcast))
        .route("/connections", get(list_connections))
}

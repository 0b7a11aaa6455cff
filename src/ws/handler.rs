//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;

use super::socket;
use crate::app_state::AppState;
use crate::error::{GatewayError, ManagerError};

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// # Errors
///
/// Returns [`GatewayError::UpgradeFailed`] if the request is not a valid
/// WebSocket handshake and [`GatewayError::Unavailable`] once the manager
/// is shutting down.
pub async fn ws_handler(
    State(state): State<AppState>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let upgrade = upgrade.map_err(|rejection| GatewayError::UpgradeFailed(rejection.body_text()))?;
    if state.manager.is_shutting_down() {
        return Err(ManagerError::ShuttingDown.into());
    }

    Ok(upgrade
        .read_buffer_size(state.config.ws_read_buffer_size)
        .write_buffer_size(state.config.ws_write_buffer_size)
        .on_failed_upgrade(|err| {
            tracing::warn!(error = %err, "websocket upgrade failed");
        })
        .on_upgrade(move |socket| register_socket(socket, state)))
}

/// Hands an upgraded socket to the connection manager.
async fn register_socket(socket: WebSocket, state: AppState) {
    let (sink, source) = socket::split(socket);
    let on_message = Arc::clone(&state.on_message);

    let accepted = state
        .manager
        .accept(sink, source, move |from, message| on_message(from, message))
        .await;

    match accepted {
        Ok(id) => tracing::info!(connection_id = %id, "websocket connected"),
        Err(err) => tracing::warn!(error = %err, "websocket refused"),
    }
}

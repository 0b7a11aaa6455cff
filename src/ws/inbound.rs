//! Application handlers for inbound messages.
//!
//! An [`OnMessage`] is shared by every receive loop, so it is called
//! concurrently from independent connections.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::WsSink;
use crate::domain::{ConnectionId, Message};
use crate::manager::ConnectionManager;

/// Inbound message handler shared by all connections.
pub type OnMessage = Arc<dyn Fn(ConnectionId, Message) -> BoxFuture<'static, ()> + Send + Sync>;

/// Rebroadcasts every inbound message to all connections, the sender
/// included.
#[must_use]
pub fn relay(manager: ConnectionManager<WsSink>) -> OnMessage {
    Arc::new(move |from: ConnectionId, message: Message| -> BoxFuture<'static, ()> {
        let manager = manager.clone();
        Box::pin(async move {
            tracing::debug!(connection_id = %from, kind = %message.kind, "relaying message");
            if let Err(err) = manager.broadcast(message).await {
                tracing::warn!(connection_id = %from, error = %err, "relay dropped message");
            }
        })
    })
}

/// Logs inbound messages and otherwise ignores them.
#[must_use]
pub fn log_only() -> OnMessage {
    Arc::new(|from: ConnectionId, message: Message| -> BoxFuture<'static, ()> {
        Box::pin(async move {
            tracing::info!(connection_id = %from, kind = %message.kind, "message received");
        })
    })
}

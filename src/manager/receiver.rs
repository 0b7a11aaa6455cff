//! Per-connection receive loop.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::ConnectionManager;
use super::connection::{MessageSink, MessageSource};
use crate::domain::{ConnectionId, Message};

/// Reads from `source` until it fails or `stop` is cancelled.
///
/// Each message is handed to `on_message` and awaited before the next
/// read. On the first read error the connection is unregistered and the
/// loop ends. `stop` is cancelled by the actor when it drops the
/// connection (failed write, removal or shutdown), so a removed
/// connection never reaches `on_message` again.
pub(crate) async fn receive_loop<W, R, F, Fut>(
    manager: ConnectionManager<W>,
    id: ConnectionId,
    mut source: R,
    on_message: F,
    stop: CancellationToken,
) where
    W: MessageSink,
    R: MessageSource,
    F: Fn(ConnectionId, Message) -> Fut,
    Fut: Future<Output = ()>,
{
    tracing::debug!(connection_id = %id, "receive loop started");

    loop {
        let read = tokio::select! {
            biased;
            () = stop.cancelled() => {
                tracing::debug!(connection_id = %id, "receive loop stopped, connection removed");
                return;
            }
            read = source.read() => read,
        };

        match read {
            Ok(_) if stop.is_cancelled() => return,
            Ok(message) => on_message(id, message).await,
            Err(err) => {
                tracing::info!(
                    connection_id = %id,
                    error = %err,
                    "read failed, unregistering connection"
                );
                let _ = manager.unregister(id).await;
                return;
            }
        }
    }
}

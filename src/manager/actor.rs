//! The sequential owner of the connection set.
//!
//! [`ManagerActor`] drains the mailbox one operation at a time. It is the
//! only code that mutates the [`ConnectionSet`] or writes to and closes a
//! connection, so none of that state needs a lock.

use std::collections::VecDeque;
use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::ManagerConfig;
use super::connection::MessageSink;
use crate::domain::{ConnectionId, ConnectionSet, Message, Operation};
use crate::error::ConnectionError;

/// A tracked connection: its write half plus the token that stops its
/// receive loop.
struct Tracked<W> {
    sink: W,
    stop: CancellationToken,
}

impl<W: MessageSink> Tracked<W> {
    /// Stops the receive loop, then closes the write half.
    async fn release(mut self, limit: Option<Duration>, id: ConnectionId) {
        self.stop.cancel();
        if let Err(err) = bounded(limit, self.sink.close()).await {
            tracing::warn!(connection_id = %id, error = %err, "failed to close connection");
        }
    }
}

/// Actor state. Constructed by [`super::ConnectionManager::new`] and moved
/// into its own task.
pub(crate) struct ManagerActor<W> {
    connections: ConnectionSet<Tracked<W>>,
    mailbox: mpsc::Receiver<Operation<W>>,
    /// Removals raised by the actor itself after a failed write. Served
    /// before the next mailbox operation.
    deferred: VecDeque<ConnectionId>,
    write_timeout: Option<Duration>,
    close_timeout: Option<Duration>,
}

impl<W: MessageSink> ManagerActor<W> {
    pub(crate) fn new(mailbox: mpsc::Receiver<Operation<W>>, config: &ManagerConfig) -> Self {
        Self {
            connections: ConnectionSet::new(),
            mailbox,
            deferred: VecDeque::new(),
            write_timeout: config.write_timeout,
            close_timeout: config.close_timeout,
        }
    }

    /// Processes operations until shutdown or until every handle is dropped.
    pub(crate) async fn run(mut self) {
        tracing::debug!("connection manager started");

        while let Some(op) = self.next_operation().await {
            tracing::trace!(op = op.name(), "processing operation");
            if self.apply(op).await.is_break() {
                break;
            }
        }

        self.close_all().await;
        tracing::debug!("connection manager stopped");
    }

    async fn next_operation(&mut self) -> Option<Operation<W>> {
        if let Some(id) = self.deferred.pop_front() {
            return Some(Operation::Remove { id });
        }
        self.mailbox.recv().await
    }

    async fn apply(&mut self, op: Operation<W>) -> ControlFlow<()> {
        match op {
            Operation::Add { id, sink, stop } => {
                if stop.is_cancelled() {
                    // Shutdown began after the registration was queued.
                    Tracked { sink, stop }.release(self.close_timeout, id).await;
                    return ControlFlow::Continue(());
                }
                if let Some(stale) = self.connections.insert(id, Tracked { sink, stop }) {
                    stale.release(self.close_timeout, id).await;
                }
                tracing::debug!(
                    connection_id = %id,
                    connections = self.connections.len(),
                    "connection added"
                );
            }
            Operation::Remove { id } => self.remove(id).await,
            Operation::Send { message } => self.send(&message).await,
            Operation::Snapshot { reply } => {
                let _ = reply.send(self.connections.ids());
            }
            Operation::Shutdown { done } => {
                self.mailbox.close();
                self.deferred.clear();
                self.close_all().await;
                let _ = done.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Writes `message` to every tracked connection. Failed connections
    /// are queued for removal and the fan-out carries on.
    async fn send(&mut self, message: &Message) {
        let write_timeout = self.write_timeout;
        for (id, tracked) in self.connections.iter_mut() {
            if let Err(err) = bounded(write_timeout, tracked.sink.write(message)).await {
                tracing::warn!(
                    connection_id = %id,
                    error = %err,
                    "write failed, connection will be removed"
                );
                self.deferred.push_back(id);
            }
        }
    }

    async fn remove(&mut self, id: ConnectionId) {
        let Some(tracked) = self.connections.remove(id) else {
            tracing::trace!(connection_id = %id, "connection already removed");
            return;
        };
        tracked.release(self.close_timeout, id).await;
        tracing::info!(
            connection_id = %id,
            connections = self.connections.len(),
            "connection removed"
        );
    }

    async fn close_all(&mut self) {
        let tracked: Vec<_> = self.connections.drain().collect();
        let closed = tracked.len();
        for (id, entry) in tracked {
            entry.release(self.close_timeout, id).await;
        }
        if closed > 0 {
            tracing::info!(closed, "closed all connections");
        }
    }
}

/// Runs `op`, failing with [`ConnectionError::TimedOut`] if it outlives
/// `limit`.
async fn bounded<F>(limit: Option<Duration>, op: F) -> Result<(), ConnectionError>
where
    F: Future<Output = Result<(), ConnectionError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, op)
            .await
            .map_err(|_| ConnectionError::TimedOut(limit))?,
        None => op.await,
    }
}

//! Connection manager: a single actor that owns every live connection.
//!
//! All mutations of the connection set and all writes go through one
//! bounded mailbox and are applied in order by [`actor::ManagerActor`].
//! Producers (receive loops, broadcasters, the upgrade handler) only ever
//! hold a cloneable [`ConnectionManager`] handle.
//!
//! ```text
//! register/accept ──┐
//! broadcast ────────┼──► mailbox (bounded, FIFO) ──► actor ──► sinks
//! receive loops ────┘          ▲                       │
//!   (Remove on read error)     └── deferred Remove ◄───┘ (write error)
//! ```

mod actor;
pub mod connection;
mod receiver;

#[cfg(test)]
pub(crate) mod fakes;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

pub use connection::{MessageSink, MessageSource};

use self::actor::ManagerActor;
use crate::domain::{ConnectionId, Message, Operation};
use crate::error::ManagerError;

/// Actor tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Mailbox slots. Producers wait once the mailbox is full. Values
    /// below 1 are treated as 1.
    pub mailbox_capacity: usize,
    /// Upper bound on a single write; `None` waits indefinitely. A
    /// timed-out write counts as a failed write.
    pub write_timeout: Option<Duration>,
    /// Upper bound on a single close; `None` waits indefinitely.
    pub close_timeout: Option<Duration>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1,
            write_timeout: None,
            close_timeout: None,
        }
    }
}

/// Handle to a running connection manager actor.
///
/// Cloning is cheap; every clone submits to the same mailbox. The actor
/// runs until [`shutdown`](Self::shutdown) is called or every handle
/// (including those held by receive loops) is dropped.
pub struct ConnectionManager<W> {
    mailbox: mpsc::Sender<Operation<W>>,
    /// Parent of every per-connection token; cancelled by shutdown.
    shutdown: CancellationToken,
    receive_loops: TaskTracker,
}

impl<W: MessageSink> ConnectionManager<W> {
    /// Spawns the actor on the current Tokio runtime and returns a handle.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(config: ManagerConfig) -> Self {
        let (mailbox, inbox) = mpsc::channel(config.mailbox_capacity.max(1));
        tokio::spawn(ManagerActor::new(inbox, &config).run());

        Self {
            mailbox,
            shutdown: CancellationToken::new(),
            receive_loops: TaskTracker::new(),
        }
    }

    /// Registers a connection's write half and returns its identity.
    ///
    /// The connection becomes visible to broadcasts once the actor
    /// processes the registration; any broadcast submitted after this
    /// call returns will reach it.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::ShuttingDown`] once shutdown has begun and
    /// [`ManagerError::Closed`] if the actor has stopped.
    pub async fn register(&self, sink: W) -> Result<ConnectionId, ManagerError> {
        self.add(sink).await.map(|(id, _)| id)
    }

    /// Registers a connection and starts its receive loop.
    ///
    /// `on_message` is awaited inside the loop for every inbound message.
    /// Independent connections call it concurrently.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register). On error no loop is started
    /// and both halves are dropped.
    pub async fn accept<R, F, Fut>(
        &self,
        sink: W,
        source: R,
        on_message: F,
    ) -> Result<ConnectionId, ManagerError>
    where
        R: MessageSource,
        F: Fn(ConnectionId, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (id, stop) = self.add(sink).await?;
        self.receive_loops.spawn(receiver::receive_loop(
            self.clone(),
            id,
            source,
            on_message,
            stop,
        ));
        Ok(id)
    }

    /// Queues `message` for delivery to every connection registered at the
    /// time the actor reaches it. Does not wait for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Closed`] if the actor has stopped.
    pub async fn broadcast(&self, message: Message) -> Result<(), ManagerError> {
        self.submit(Operation::Send { message }).await
    }

    /// Queues removal of `id`. Removing an unknown id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Closed`] if the actor has stopped.
    pub async fn unregister(&self, id: ConnectionId) -> Result<(), ManagerError> {
        self.submit(Operation::Remove { id }).await
    }

    /// Returns the ids registered at this point in mailbox order.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Closed`] if the actor has stopped.
    pub async fn connections(&self) -> Result<Vec<ConnectionId>, ManagerError> {
        let (reply, response) = oneshot::channel();
        self.submit(Operation::Snapshot { reply }).await?;
        response.await.map_err(|_| ManagerError::Closed)
    }

    /// Stops the manager.
    ///
    /// Refuses new registrations, closes every connection, stops the actor
    /// and waits for all receive loops to exit. Safe to call more than
    /// once; later calls only wait for the receive loops.
    pub async fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            self.shutdown.cancel();
            tracing::info!("connection manager shutting down");
            let (done, closed) = oneshot::channel();
            if self.submit(Operation::Shutdown { done }).await.is_ok() {
                let _ = closed.await;
            }
        }
        self.receive_loops.close();
        self.receive_loops.wait().await;
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Submits an Add and hands back the token that stops the
    /// connection's receive loop. A token minted after shutdown starts
    /// is already cancelled.
    async fn add(&self, sink: W) -> Result<(ConnectionId, CancellationToken), ManagerError> {
        if self.is_shutting_down() {
            return Err(ManagerError::ShuttingDown);
        }
        let id = ConnectionId::new();
        let stop = self.shutdown.child_token();
        self.submit(Operation::Add {
            id,
            sink,
            stop: stop.clone(),
        })
        .await?;
        Ok((id, stop))
    }

    async fn submit(&self, op: Operation<W>) -> Result<(), ManagerError> {
        self.mailbox
            .send(op)
            .await
            .map_err(|_| ManagerError::Closed)
    }
}

impl<W> Clone for ConnectionManager<W> {
    fn clone(&self) -> Self {
        Self {
            mailbox: self.mailbox.clone(),
            shutdown: self.shutdown.clone(),
            receive_loops: self.receive_loops.clone(),
        }
    }
}

impl<W> fmt::Debug for ConnectionManager<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("mailbox_capacity", &self.mailbox.max_capacity())
            .field("shutting_down", &self.shutdown.is_cancelled())
            .field("receive_loops", &self.receive_loops.len())
            .finish()
    }
}

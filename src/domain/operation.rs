//! Commands accepted by the connection manager's mailbox.

use std::fmt;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::{ConnectionId, Message};

/// A single command for the manager actor.
///
/// Operations are moved into the mailbox and consumed exactly once, in
/// submission order. `W` is the write half of a connection.
pub enum Operation<W> {
    /// Start tracking a connection's write half under `id`.
    Add {
        /// Identity assigned at registration.
        id: ConnectionId,
        /// Write half owned by the actor from now on.
        sink: W,
        /// Cancelled when the actor drops the connection, which stops the
        /// matching receive loop.
        stop: CancellationToken,
    },
    /// Close and forget a connection. No-op if it is already gone.
    Remove {
        /// Connection to drop.
        id: ConnectionId,
    },
    /// Write `message` to every connection currently tracked.
    Send {
        /// Message to fan out.
        message: Message,
    },
    /// Report the ids tracked at this point in mailbox order.
    Snapshot {
        /// Receives the ids.
        reply: oneshot::Sender<Vec<ConnectionId>>,
    },
    /// Close every connection and stop the actor.
    Shutdown {
        /// Signalled once all connections are closed.
        done: oneshot::Sender<()>,
    },
}

impl<W> Operation<W> {
    /// Short lowercase name used in log fields.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Send { .. } => "send",
            Self::Snapshot { .. } => "snapshot",
            Self::Shutdown { .. } => "shutdown",
        }
    }
}

impl<W> fmt::Debug for Operation<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add { id, .. } | Self::Remove { id } => f
                .debug_struct(self.name())
                .field("id", id)
                .finish_non_exhaustive(),
            Self::Send { message } => f.debug_struct("send").field("kind", &message.kind).finish(),
            Self::Snapshot { .. } | Self::Shutdown { .. } => f.write_str(self.name()),
        }
    }
}

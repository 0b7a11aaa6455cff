//! Connection capabilities consumed by the manager.
//!
//! A connection is split into a write half ([`MessageSink`]) owned by the
//! manager actor and a read half ([`MessageSource`]) owned by that
//! connection's receive loop. Neither half is ever used from two tasks at
//! once.

use std::future::Future;

use crate::domain::Message;
use crate::error::ConnectionError;

/// Write half of a connection.
pub trait MessageSink: Send + 'static {
    /// Writes one message.
    ///
    /// # Errors
    ///
    /// Any error means the connection is unusable and will be removed.
    fn write(&mut self, message: &Message)
    -> impl Future<Output = Result<(), ConnectionError>> + Send;

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Errors are logged by the caller and otherwise ignored.
    fn close(&mut self) -> impl Future<Output = Result<(), ConnectionError>> + Send;
}

/// Read half of a connection.
pub trait MessageSource: Send + 'static {
    /// Waits for the next inbound message.
    ///
    /// # Errors
    ///
    /// Returns an error once the connection can no longer produce
    /// messages; the receive loop treats this as a disconnect.
    fn read(&mut self) -> impl Future<Output = Result<Message, ConnectionError>> + Send;
}

//! Domain layer: connection identity, the wire message, manager
//! operations and the connection set they act on.

pub mod connection_id;
pub mod connection_set;
pub mod message;
pub mod operation;

pub use connection_id::ConnectionId;
pub use connection_set::ConnectionSet;
pub use message::Message;
pub use operation::Operation;

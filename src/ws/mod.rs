//! WebSocket layer: upgrade handling, socket adapters and inbound handlers.
//!
//! The endpoint at `/ws` upgrades the request, splits the socket into the
//! halves the [`crate::manager::ConnectionManager`] consumes, and registers
//! it together with the application's inbound handler.

pub mod handler;
pub mod inbound;
pub mod socket;

pub use inbound::OnMessage;
pub use socket::{WsSink, WsSource};

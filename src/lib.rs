//! # fanout-gateway
//!
//! WebSocket fan-out gateway. Clients connect over `/ws`; server-side code
//! (or `POST /api/v1/broadcast`) sends a message to every connected client.
//!
//! WebSocket write halves must never be written from two tasks at once and
//! the set of live connections changes constantly, so both are owned by a
//! single actor. Everything else talks to it through a bounded FIFO
//! mailbox.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Upgrade + Socket Adapters (ws/)
//!     │
//!     ├── ConnectionManager handle (manager/)
//!     │       │ mailbox: Operation (domain/)
//!     │       ▼
//!     ├── Manager actor ── ConnectionSet (domain/)
//!     │
//!     └── Receive loops (one per connection)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod manager;
pub mod ws;

//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

use crate::manager::ManagerConfig;

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Number of operations the manager mailbox buffers before producers
    /// wait.
    pub mailbox_capacity: usize,

    /// WebSocket read buffer size in bytes.
    pub ws_read_buffer_size: usize,

    /// WebSocket write buffer size in bytes.
    pub ws_write_buffer_size: usize,

    /// Per-write bound in milliseconds (0 = unbounded).
    pub write_timeout_ms: u64,

    /// Per-close bound in milliseconds (0 = unbounded).
    pub close_timeout_ms: u64,

    /// Whether the default inbound handler rebroadcasts every message.
    pub relay_inbound: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            mailbox_capacity: 1,
            ws_read_buffer_size: 1024,
            ws_write_buffer_size: 1024,
            write_timeout_ms: 0,
            close_timeout_ms: 0,
            relay_inbound: true,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to the [`Default`] values when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        Ok(Self {
            listen_addr,
            mailbox_capacity: parse_env("MAILBOX_CAPACITY", defaults.mailbox_capacity),
            ws_read_buffer_size: parse_env("WS_READ_BUFFER_SIZE", defaults.ws_read_buffer_size),
            ws_write_buffer_size: parse_env("WS_WRITE_BUFFER_SIZE", defaults.ws_write_buffer_size),
            write_timeout_ms: parse_env("WRITE_TIMEOUT_MS", defaults.write_timeout_ms),
            close_timeout_ms: parse_env("CLOSE_TIMEOUT_MS", defaults.close_timeout_ms),
            relay_inbound: parse_env_bool("RELAY_INBOUND", defaults.relay_inbound),
        })
    }

    /// The subset of settings the connection manager needs.
    #[must_use]
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            mailbox_capacity: self.mailbox_capacity.max(1),
            write_timeout: millis(self.write_timeout_ms),
            close_timeout: millis(self.close_timeout_ms),
        }
    }
}

/// `0` disables the bound.
fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.to_ascii_lowercase())
        .as_deref()
    {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

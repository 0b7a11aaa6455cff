//! Shared application state injected into all Axum handlers.

use std::fmt;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::manager::ConnectionManager;
use crate::ws::{OnMessage, WsSink, inbound};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the connection manager actor.
    pub manager: ConnectionManager<WsSink>,
    /// Handler invoked for every inbound WebSocket message.
    pub on_message: OnMessage,
    /// Runtime configuration.
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Spawns a connection manager and picks the inbound handler from
    /// `config.relay_inbound`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        let manager = ConnectionManager::new(config.manager_config());
        let on_message = if config.relay_inbound {
            inbound::relay(manager.clone())
        } else {
            inbound::log_only()
        };
        Self::with_handler(config, manager, on_message)
    }

    /// Builds state around an existing manager and a custom handler.
    #[must_use]
    pub fn with_handler(
        config: GatewayConfig,
        manager: ConnectionManager<WsSink>,
        on_message: OnMessage,
    ) -> Self {
        Self {
            manager,
            on_message,
            config: Arc::new(config),
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("manager", &self.manager)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

//! fanout-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use tracing_subscriber::EnvFilter;

use fanout_gateway::api;
use fanout_gateway::app_state::AppState;
use fanout_gateway::config::GatewayConfig;
use fanout_gateway::manager::ConnectionManager;
use fanout_gateway::ws::WsSink;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        mailbox_capacity = config.mailbox_capacity,
        relay_inbound = config.relay_inbound,
        "starting fanout-gateway"
    );

    // Build application state (spawns the connection manager actor)
    let app_state = AppState::new(config.clone());
    let manager = app_state.manager.clone();

    // Build router
    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(manager))
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C after closing every WebSocket connection.
async fn shutdown_signal(manager: ConnectionManager<WsSink>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
    manager.shutdown().await;
}

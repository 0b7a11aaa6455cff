//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` and the
//! WebSocket endpoint `/ws` live at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "fanout-gateway",
        description = "Broadcast JSON messages to every connected WebSocket client."
    ),
    paths(
        handlers::broadcast::broadcast,
        handlers::broadcast::list_connections,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Broadcast", description = "Fan-out to connected clients"),
        (name = "System", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the full application: REST, `/ws`, optional Swagger UI and the
/// HTTP middleware stack.
pub fn build_app(state: AppState) -> Router {
    let router = build_router().route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub mod generation_task;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{
    middleware as axum_middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

// Re-export the handlers the binary wires into the router.
pub use middleware::require_identity;
pub use rest::{
    clear_documents_handler, export_document_handler, health_handler, list_documents_handler,
    profile_handler,
};
pub use ws_handler::ws_handler;

/// Builds the API router: public health check plus identity-protected routes.
pub fn build_router(app_state: Arc<state::AppState>, cors: CorsLayer) -> Router {
    let public_routes = Router::new().route("/health", get(health_handler));

    let protected_routes = Router::new()
        .route(
            "/documents",
            get(list_documents_handler).delete(clear_documents_handler),
        )
        .route("/documents/{id}/export", get(export_document_handler))
        .route("/profile", get(profile_handler))
        .route("/editor/{kind}/ws", get(ws_handler))
        .layer(axum_middleware::from_fn(require_identity));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state)
}

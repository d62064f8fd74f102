//! Router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/css/{file}", get(handlers::stylesheet))
        .route("/attachments/{*path}", get(handlers::attachment))
        .route("/articles.xml", get(handlers::articles_feed))
        .route("/sitemap.xml", get(handlers::sitemap))
        .route("/{*path}", get(handlers::page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, routing::post};
use tower_http::trace::TraceLayer;

use crate::handlers::{clone, upload};
use crate::state::AppState;

/// Create the API router with the two proxy routes.
///
/// `max_upload_bytes` caps the inbound multipart body; requests above it are
/// rejected by axum before the handler runs.
pub fn create_api_router(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/upload", post(upload::upload_audio))
        .route("/api/clone", post(clone::clone_voice))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
}

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, logs, state::SharedState};

/// Statement workbooks are small; 32 MiB leaves headroom for a whole
/// month of uploads in one form post.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Create the main application router with all endpoints
pub fn create_router(state: SharedState) -> Router {
    // Create CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Upload form + multipart ingest
        .route("/", get(handlers::upload_form).post(handlers::upload_files))
        // Run status page and its event stream
        .route("/status", get(handlers::status_page))
        .route("/stream-logs", get(logs::stream_logs))
        // Add shared state
        .with_state(state)
        // Add middleware
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

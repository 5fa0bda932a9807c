//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // OCR
        .route("/ocr/", post(handlers::ocr_upload))
        // Stored texts
        .route("/texts/", get(handlers::list_texts))
        .route("/texts/search", get(handlers::search_texts))
        .route("/texts/similarity", post(handlers::similarity_search))
        .route("/texts/summarize", post(handlers::summarize))
        .route("/stats", get(handlers::stats))
        // Projects
        .route(
            "/projects/",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route("/projects/:project_id", get(handlers::get_project))
        // Local models
        .route("/ollama/models", get(handlers::installed_models))
        .route("/ollama/models/running", get(handlers::running_models))
        // Analytics
        .route("/analytics/project_counts", get(handlers::project_counts))
        .route("/analytics/activity", get(handlers::activity))
        .route("/analytics/length_histogram", get(handlers::length_histogram))
        .route("/analytics/top_filenames", get(handlers::top_filenames))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

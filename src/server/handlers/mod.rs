//! HTTP request handlers for the web server.

mod analytics;
mod helpers;
mod models;
mod ocr;
mod projects;
mod texts;

use axum::http::StatusCode;
use axum::response::IntoResponse;

pub use analytics::{activity, length_histogram, project_counts, stats, top_filenames};
pub use models::{installed_models, running_models};
pub use ocr::ocr_upload;
pub use projects::{create_project, get_project, list_projects};
pub use texts::{list_texts, search_texts, similarity_search, summarize};

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, axum::Json(serde_json::json!({ "status": "ok" })))
}

//! Helper types for handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::ocr::OcrError;
use crate::services::ServiceError;

/// Optional project scope shared by listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectFilter {
    pub project_id: Option<i32>,
}

/// JSON error response: `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let status = match &e {
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Ocr(OcrError::Api { .. })
            | ServiceError::Ocr(OcrError::Request { .. })
            | ServiceError::Ocr(OcrError::RateLimited { .. })
            | ServiceError::Ocr(OcrError::Parse { .. })
            | ServiceError::Ocr(OcrError::ModelNotFound(_)) => StatusCode::BAD_GATEWAY,
            ServiceError::Ocr(_) | ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", e);
        }
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

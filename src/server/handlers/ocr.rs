//! OCR upload handler.

use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::Deserialize;

use super::super::AppState;
use super::helpers::{ApiError, ApiResult};
use crate::models::ExtractionRequest;
use crate::services::ProcessedText;

#[derive(Debug, Default, Deserialize)]
pub struct OcrParams {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub project_id: Option<i32>,
}

/// Extract, embed and store text from an uploaded image (`file` field).
pub async fn ocr_upload(
    State(state): State<AppState>,
    Query(params): Query<OcrParams>,
    mut multipart: Multipart,
) -> ApiResult<ProcessedText> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let is_image = field
            .content_type()
            .map(|ct| ct.starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            return Err(ApiError::bad_request("File must be an image."));
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let Some((filename, image)) = upload else {
        return Err(ApiError::bad_request("Missing 'file' field"));
    };

    let request = ExtractionRequest {
        image,
        filename,
        provider: params.provider.filter(|p| !p.trim().is_empty()),
        model: params.model.filter(|m| !m.trim().is_empty()),
        project_id: params.project_id,
    };

    let processed = state.services.ocr.process(request, true).await?;
    Ok(Json(processed))
}

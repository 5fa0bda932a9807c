//! Stored text handlers.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::super::AppState;
use super::helpers::{ApiError, ApiResult, ProjectFilter};
use crate::models::{ScoredText, StoredText};
use crate::services::{SummarizeRequest, Summary};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub project_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarityQuery {
    pub query: String,
    pub project_id: Option<i32>,
    pub provider: Option<String>,
}

pub async fn list_texts(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> ApiResult<Vec<StoredText>> {
    Ok(Json(state.services.ocr.list(filter.project_id).await?))
}

pub async fn search_texts(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<StoredText>> {
    if params.q.is_empty() {
        return Err(ApiError::bad_request("Query parameter 'q' is required"));
    }
    Ok(Json(state.services.ocr.search(&params.q, params.project_id).await?))
}

pub async fn similarity_search(
    State(state): State<AppState>,
    Json(body): Json<SimilarityQuery>,
) -> ApiResult<Vec<ScoredText>> {
    let results = state
        .services
        .ocr
        .similarity_search(&body.query, body.project_id, body.provider.as_deref())
        .await?;
    Ok(Json(results))
}

pub async fn summarize(
    State(state): State<AppState>,
    Json(body): Json<SummarizeRequest>,
) -> ApiResult<Summary> {
    Ok(Json(state.services.summarize.summarize(&body).await?))
}

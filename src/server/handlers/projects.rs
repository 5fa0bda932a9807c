//! Project handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::super::AppState;
use super::helpers::{ApiError, ApiResult};
use crate::models::Project;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state
        .services
        .projects
        .create(&body.name, body.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Vec<Project>> {
    Ok(Json(state.services.projects.list().await?))
}

pub async fn get_project(State(state): State<AppState>, Path(project_id): Path<i32>) -> ApiResult<Project> {
    Ok(Json(state.services.projects.get(project_id).await?))
}

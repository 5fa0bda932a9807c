//! Local model handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::super::AppState;
use super::helpers::ApiResult;

#[derive(Debug, Serialize)]
pub struct ModelList {
    pub models: Vec<String>,
}

pub async fn installed_models(State(state): State<AppState>) -> ApiResult<ModelList> {
    let models = state.services.models.installed().await?;
    Ok(Json(ModelList { models }))
}

pub async fn running_models(State(state): State<AppState>) -> ApiResult<ModelList> {
    let models = state.services.models.running().await?;
    Ok(Json(ModelList { models }))
}

//! Analytics handlers.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::super::AppState;
use super::helpers::{ApiResult, ProjectFilter};
use crate::services::analytics::{Activity, FilenameCount, Interval, LengthHistogram, ProjectCount, Stats};

#[derive(Debug, Deserialize)]
pub struct ActivityParams {
    pub project_id: Option<i32>,
    pub interval: Option<String>,
    pub points: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct HistogramParams {
    pub project_id: Option<i32>,
    pub bins: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TopParams {
    pub project_id: Option<i32>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProjectCounts {
    pub projects: Vec<ProjectCount>,
}

#[derive(Debug, Serialize)]
pub struct TopFilenames {
    pub top: Vec<FilenameCount>,
}

pub async fn stats(State(state): State<AppState>, Query(filter): Query<ProjectFilter>) -> ApiResult<Stats> {
    Ok(Json(state.services.analytics.stats(filter.project_id).await?))
}

pub async fn project_counts(State(state): State<AppState>) -> ApiResult<ProjectCounts> {
    let projects = state.services.analytics.project_counts().await?;
    Ok(Json(ProjectCounts { projects }))
}

pub async fn activity(State(state): State<AppState>, Query(params): Query<ActivityParams>) -> ApiResult<Activity> {
    let interval = Interval::parse(params.interval.as_deref());
    let points = params.points.unwrap_or(30);
    Ok(Json(
        state
            .services
            .analytics
            .activity(params.project_id, interval, points)
            .await?,
    ))
}

pub async fn length_histogram(
    State(state): State<AppState>,
    Query(params): Query<HistogramParams>,
) -> ApiResult<LengthHistogram> {
    let bins = params.bins.unwrap_or(10);
    Ok(Json(
        state
            .services
            .analytics
            .length_histogram(params.project_id, bins)
            .await?,
    ))
}

pub async fn top_filenames(State(state): State<AppState>, Query(params): Query<TopParams>) -> ApiResult<TopFilenames> {
    let limit = params.limit.unwrap_or(10);
    let top = state
        .services
        .analytics
        .top_filenames(params.project_id, limit)
        .await?;
    Ok(Json(TopFilenames { top }))
}

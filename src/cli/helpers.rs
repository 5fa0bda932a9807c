//! Shared helper functions for CLI commands.

use crate::services::{ServiceResult, Services};

/// Truncate a string to `max` characters with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Collapse a text to a single-line preview.
pub fn preview(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate(&flat, max)
}

/// Resolve an optional `--project` argument (ID or name) to a project ID.
pub async fn resolve_project(services: &Services, project: Option<&str>) -> ServiceResult<Option<i32>> {
    match project {
        Some(p) => Ok(Some(services.projects.resolve(p).await?.id)),
        None => Ok(None),
    }
}

//! Project model.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A named group of stored texts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

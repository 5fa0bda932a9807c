//! Stored text models.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A persisted extraction result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredText {
    pub id: i32,
    pub filename: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub provider: String,
    pub project_id: Option<i32>,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl StoredText {
    /// Number of characters in the text.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A stored text with its similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredText {
    #[serde(flatten)]
    pub text: StoredText,
    pub score: f32,
}

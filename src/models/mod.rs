//! Data models for Scrivener.

mod extraction;
mod project;
mod text;

pub use extraction::{ExtractionRequest, ExtractionResult};
pub use project::Project;
pub use text::{ScoredText, StoredText};

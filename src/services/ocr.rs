//! Text extraction and retrieval service.

use serde::Serialize;
use tracing::{debug, info};

use super::{ServiceError, ServiceResult};
use crate::embedding::EmbeddingBackend;
use crate::models::{ExtractionRequest, ScoredText, StoredText};
use crate::pipeline::ExtractionPipeline;
use crate::repository::DbContext;
use crate::similarity;

/// Outcome of processing one upload.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedText {
    /// Row ID, when the result was saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub text: String,
    pub provider: String,
    pub project_id: Option<i32>,
    #[serde(skip)]
    pub embedded: bool,
}

/// Runs the extraction pipeline and serves stored texts.
#[derive(Clone)]
pub struct OcrService {
    pipeline: ExtractionPipeline,
    db: DbContext,
    top_k: usize,
}

impl OcrService {
    pub fn new(pipeline: ExtractionPipeline, db: DbContext, top_k: usize) -> Self {
        Self { pipeline, db, top_k }
    }

    /// Extract text from an image and optionally persist it.
    pub async fn process(&self, request: ExtractionRequest, save: bool) -> ServiceResult<ProcessedText> {
        if request.image.is_empty() {
            return Err(ServiceError::InvalidInput("Image is empty".to_string()));
        }
        if let Some(project_id) = request.project_id {
            if self.db.projects().get(project_id).await?.is_none() {
                return Err(ServiceError::NotFound("Project not found".to_string()));
            }
        }

        let result = self
            .pipeline
            .extract(&request)
            .await
            .map_err(ServiceError::from_ocr)?;

        let id = if save {
            let stored = self
                .db
                .texts()
                .insert(&result, request.filename.as_deref(), request.project_id)
                .await?;
            info!("Saved text {} from {}", stored.id, stored.provider);
            Some(stored.id)
        } else {
            None
        };

        Ok(ProcessedText {
            id,
            embedded: result.embedding.is_some(),
            text: result.text,
            provider: result.provider,
            project_id: request.project_id,
        })
    }

    /// Stored texts, newest first.
    pub async fn list(&self, project_id: Option<i32>) -> ServiceResult<Vec<StoredText>> {
        Ok(self.db.texts().list(project_id).await?)
    }

    /// Case-insensitive substring search.
    pub async fn search(&self, query: &str, project_id: Option<i32>) -> ServiceResult<Vec<StoredText>> {
        if query.is_empty() {
            return Err(ServiceError::InvalidInput("Query must not be empty".to_string()));
        }
        Ok(self.db.texts().search(query, project_id).await?)
    }

    /// Rank stored texts by cosine similarity to the query.
    ///
    /// The query is embedded with the local backend when `provider` is
    /// "ollama", otherwise with the cloud backend. Stored vectors of a
    /// different dimensionality are ignored.
    pub async fn similarity_search(
        &self,
        query: &str,
        project_id: Option<i32>,
        provider: Option<&str>,
    ) -> ServiceResult<Vec<ScoredText>> {
        if query.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Query must not be empty".to_string()));
        }

        let backend = EmbeddingBackend::for_selector(provider);
        let query_vector = self.pipeline.embeddings().embed(backend, query, None).await?;
        let candidates = self.db.texts().with_embeddings(project_id).await?;
        debug!(
            "Ranking {} candidates against {}-dim query",
            candidates.len(),
            query_vector.len()
        );

        let ranked = similarity::rank(
            &query_vector,
            candidates.iter().enumerate().filter_map(|(i, t)| {
                t.embedding.as_deref().map(|v| (i, v))
            }),
            self.top_k,
        );

        Ok(ranked
            .into_iter()
            .map(|(i, score)| ScoredText {
                text: candidates[i].clone(),
                score,
            })
            .collect())
    }
}

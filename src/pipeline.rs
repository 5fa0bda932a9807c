//! Extraction pipeline: image bytes to text, provenance and embedding.

use std::sync::Arc;

use tracing::info;

use crate::embedding::EmbeddingClient;
use crate::models::{ExtractionRequest, ExtractionResult};
use crate::ocr::{decode_image, OcrError, OcrOrchestrator, ProviderFamily};

/// Runs one request through the orchestrator and the embedding step.
#[derive(Clone)]
pub struct ExtractionPipeline {
    orchestrator: Arc<OcrOrchestrator>,
    embeddings: EmbeddingClient,
    default_provider: String,
}

impl ExtractionPipeline {
    pub fn new(orchestrator: Arc<OcrOrchestrator>, embeddings: EmbeddingClient) -> Self {
        Self {
            orchestrator,
            embeddings,
            default_provider: ProviderFamily::Primary.as_str().to_string(),
        }
    }

    /// Provider selector used when a request names none.
    pub fn with_default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = provider.into();
        self
    }

    pub fn orchestrator(&self) -> &OcrOrchestrator {
        &self.orchestrator
    }

    pub fn embeddings(&self) -> &EmbeddingClient {
        &self.embeddings
    }

    /// Extract text from the request's image and embed it.
    pub async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, OcrError> {
        let image = decode_image(&request.image)?;
        let selector = request.provider.as_deref().unwrap_or(&self.default_provider);
        let family = ProviderFamily::from_selector(Some(selector));
        let model = request.model.as_deref();

        let outcome = self.orchestrator.run(image, family, model).await?;
        let embedding = self
            .embeddings
            .embed_for(&outcome.provider, &outcome.text, model)
            .await?;

        info!(
            "Extracted {} chars via {} (embedding: {})",
            outcome.text.len(),
            outcome.provider,
            embedding.as_ref().map(|e| e.len()).unwrap_or(0)
        );

        Ok(ExtractionResult {
            text: outcome.text,
            provider: outcome.provider,
            embedding,
        })
    }
}

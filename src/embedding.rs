//! Embedding client.
//!
//! Picks the embedding backend from the provenance of the text so stored
//! vectors stay in the embedding space of the family that produced them.

use std::sync::Arc;

use tracing::debug;

use crate::ocr::{OcrError, OcrProvider};

/// Which backend embeds a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Hosted embedding model (OpenAI).
    Cloud,
    /// Local Ollama embeddings.
    Local,
}

impl EmbeddingBackend {
    /// Backend for text with the given provenance tag.
    pub fn for_provenance(provenance: &str) -> Self {
        if provenance.starts_with("ollama") {
            Self::Local
        } else {
            Self::Cloud
        }
    }

    /// Backend for a query issued with the given provider selector.
    pub fn for_selector(selector: Option<&str>) -> Self {
        match selector.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("ollama") => Self::Local,
            _ => Self::Cloud,
        }
    }
}

/// Turns text into vectors using the cloud or local provider.
#[derive(Clone)]
pub struct EmbeddingClient {
    cloud: Arc<dyn OcrProvider>,
    local: Arc<dyn OcrProvider>,
}

impl EmbeddingClient {
    pub fn new(cloud: Arc<dyn OcrProvider>, local: Arc<dyn OcrProvider>) -> Self {
        Self { cloud, local }
    }

    /// Embed text with an explicit backend.
    ///
    /// `model` applies to the local backend only; the cloud backend always
    /// uses its configured embedding model.
    pub async fn embed(
        &self,
        backend: EmbeddingBackend,
        text: &str,
        model: Option<&str>,
    ) -> Result<Vec<f32>, OcrError> {
        debug!("Embedding {} chars via {:?}", text.len(), backend);
        match backend {
            EmbeddingBackend::Cloud => self.cloud.embed(text, None).await,
            EmbeddingBackend::Local => self.local.embed(text, model).await,
        }
    }

    /// Embed an extraction result's text.
    ///
    /// Returns `None` without calling any backend when the text is blank.
    pub async fn embed_for(
        &self,
        provenance: &str,
        text: &str,
        model: Option<&str>,
    ) -> Result<Option<Vec<f32>>, OcrError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let backend = EmbeddingBackend::for_provenance(provenance);
        self.embed(backend, text, model).await.map(Some)
    }
}

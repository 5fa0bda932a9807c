//! Local model listing.

use std::sync::Arc;

use super::ServiceResult;
use crate::ocr::{OcrProvider, OllamaProvider};

/// Lists models on the local Ollama server.
pub struct LocalModelService {
    ollama: Arc<OllamaProvider>,
}

impl LocalModelService {
    pub fn new(ollama: Arc<OllamaProvider>) -> Self {
        Self { ollama }
    }

    /// Installed models.
    pub async fn installed(&self) -> ServiceResult<Vec<String>> {
        Ok(self.ollama.list_models().await?)
    }

    /// Models currently loaded in memory.
    pub async fn running(&self) -> ServiceResult<Vec<String>> {
        Ok(self.ollama.running_models().await?)
    }
}

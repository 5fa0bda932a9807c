//! Transient pipeline input and output.

use serde::Serialize;

/// One image to extract text from.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRequest {
    /// Raw image bytes in any format the image decoder understands.
    pub image: Vec<u8>,
    /// Original filename, if the upload carried one.
    pub filename: Option<String>,
    /// Provider selector ("openai", "gemini", "ollama", ...).
    pub provider: Option<String>,
    /// Model override for the selected provider.
    pub model: Option<String>,
    /// Project the result belongs to.
    pub project_id: Option<i32>,
}

impl ExtractionRequest {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            ..Self::default()
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_project(mut self, project_id: i32) -> Self {
        self.project_id = Some(project_id);
        self
    }
}

/// Text extracted from one image.
///
/// `embedding` is present exactly when `text` has non-whitespace content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub text: String,
    /// Provenance tag, e.g. `openai+preprocess` or `tesseract`.
    pub provider: String,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

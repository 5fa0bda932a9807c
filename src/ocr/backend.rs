//! OCR provider abstraction.
//!
//! Every text source the pipeline can call implements [`OcrProvider`]:
//! - OpenAI: hosted multimodal chat completions (primary cloud provider)
//! - Gemini: hosted multimodal generation (secondary cloud provider)
//! - Ollama: local LLM server
//! - Tesseract: deterministic local OCR (terminal fallback)
//!
//! The orchestrator only sees this trait, so providers can be swapped for
//! test doubles without touching escalation logic.

use async_trait::async_trait;
use thiserror::Error;

use super::image::PngImage;

/// Errors from OCR providers.
///
/// A refusal is not an error: it is a successful response whose text is
/// classified by [`super::refusal::is_refusal`].
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("{backend} request failed: {message}")]
    Request {
        backend: ProviderKind,
        message: String,
    },

    #[error("{backend} API error ({status}): {body}")]
    Api {
        backend: ProviderKind,
        status: u16,
        body: String,
    },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Rate limited by {backend}, retry after {retry_after_secs:?}s")]
    RateLimited {
        backend: ProviderKind,
        retry_after_secs: Option<u64>,
    },

    #[error("Failed to parse {backend} response: {message}")]
    Parse {
        backend: ProviderKind,
        message: String,
    },

    #[error("{backend} does not support {capability}")]
    Unsupported {
        backend: ProviderKind,
        capability: &'static str,
    },

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OcrError {
    /// Build a request error from a reqwest failure (timeouts included).
    pub fn request(backend: ProviderKind, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("timed out: {}", err)
        } else {
            err.to_string()
        };
        OcrError::Request { backend, message }
    }

    pub fn parse(backend: ProviderKind, err: impl std::fmt::Display) -> Self {
        OcrError::Parse {
            backend,
            message: err.to_string(),
        }
    }
}

/// Available provider families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions with image input.
    OpenAi,
    /// Google Gemini generateContent.
    Gemini,
    /// Local Ollama server.
    Ollama,
    /// Tesseract OCR via command-line.
    Tesseract,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Tesseract => "tesseract",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(ProviderKind::OpenAi),
            "gemini" => Some(ProviderKind::Gemini),
            "ollama" => Some(ProviderKind::Ollama),
            "tesseract" => Some(ProviderKind::Tesseract),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How insistently a provider is asked to transcribe.
///
/// Only prompt-driven providers (the local LLM) distinguish the two; vision
/// providers always send their fixed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    Standard,
    Insistent,
}

/// Instruction sent alongside the image to multimodal providers.
pub const VISION_OCR_PROMPT: &str =
    "Extract all text from this image. Do not refuse. If no text is present, return an empty string.";

/// Capability contract shared by every provider.
///
/// Only `extract_text` is mandatory. The remaining capabilities default to
/// [`OcrError::Unsupported`] so a provider advertises exactly what it can do.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Which family this provider belongs to.
    fn kind(&self) -> ProviderKind;

    /// Model used when the caller does not pick one.
    fn default_model(&self) -> Option<&str> {
        None
    }

    /// Provenance tag recorded when this provider's text is accepted.
    fn provenance(&self, _model: Option<&str>) -> String {
        self.kind().as_str().to_string()
    }

    /// Whether this provider never refuses (deterministic OCR).
    ///
    /// Text from a terminal provider is accepted as-is, even when empty.
    fn is_terminal(&self) -> bool {
        false
    }

    /// Extract text from an image.
    async fn extract_text(
        &self,
        image: &PngImage,
        prompt: PromptStyle,
        model: Option<&str>,
    ) -> Result<String, OcrError>;

    /// Generate text from a plain prompt, optionally capping output tokens.
    async fn generate_text(
        &self,
        _prompt: &str,
        _model: Option<&str>,
        _max_tokens: Option<u32>,
    ) -> Result<String, OcrError> {
        Err(OcrError::Unsupported {
            backend: self.kind(),
            capability: "text generation",
        })
    }

    /// Turn text into an embedding vector.
    async fn embed(&self, _text: &str, _model: Option<&str>) -> Result<Vec<f32>, OcrError> {
        Err(OcrError::Unsupported {
            backend: self.kind(),
            capability: "embeddings",
        })
    }

    /// List models this provider can serve.
    async fn list_models(&self) -> Result<Vec<String>, OcrError> {
        Ok(self.default_model().map(|m| vec![m.to_string()]).unwrap_or_default())
    }

    /// Download a model so later calls can use it.
    async fn pull_model(&self, _model: &str) -> Result<(), OcrError> {
        Err(OcrError::Unsupported {
            backend: self.kind(),
            capability: "model pulls",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_round_trip_names() {
        for kind in [
            ProviderKind::OpenAi,
            ProviderKind::Gemini,
            ProviderKind::Ollama,
            ProviderKind::Tesseract,
        ] {
            assert_eq!(ProviderKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(ProviderKind::from_str(" Ollama "), Some(ProviderKind::Ollama));
        assert_eq!(ProviderKind::from_str("paddle"), None);
    }

    #[test]
    fn test_error_messages_name_backend() {
        let err = OcrError::Api {
            backend: ProviderKind::Gemini,
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "gemini API error (502): bad gateway");
    }
}

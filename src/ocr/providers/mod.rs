//! Provider adapters.

mod gemini;
pub mod http;
mod ollama;
mod openai;
mod tesseract;

use std::sync::Arc;
use std::time::Duration;

pub use gemini::GeminiProvider;
pub use ollama::{ocr_prompt, OllamaProvider, INSISTENT_PROMPT, STANDARD_PROMPT};
pub use openai::OpenAiProvider;
pub use tesseract::TesseractProvider;

use super::backend::OcrError;
use super::orchestrator::ProviderSet;
use super::resolver::EndpointResolver;
use crate::config::Settings;

/// Every concrete provider built from settings.
///
/// The trait-object view used by the orchestrator is in `set`; the Ollama
/// adapter is also kept concrete for model management calls.
#[derive(Clone)]
pub struct ProviderRegistry {
    pub set: ProviderSet,
    pub ollama: Arc<OllamaProvider>,
    pub resolver: Arc<EndpointResolver>,
}

impl ProviderRegistry {
    /// Build all providers. The endpoint resolver is created once here and
    /// shared by every Ollama call for the life of the registry.
    pub fn from_settings(settings: &Settings) -> Result<Self, OcrError> {
        let resolver = Arc::new(EndpointResolver::with_http_check(
            &settings.ollama.endpoint,
            &settings.ollama.fallback_endpoints,
            Duration::from_millis(settings.ollama.liveness_timeout_ms),
        ));
        Self::with_resolver(settings, resolver)
    }

    /// Build all providers around an existing resolver.
    pub fn with_resolver(settings: &Settings, resolver: Arc<EndpointResolver>) -> Result<Self, OcrError> {
        let ollama = Arc::new(OllamaProvider::new(settings.ollama.clone(), Arc::clone(&resolver))?);
        let set = ProviderSet {
            openai: Arc::new(OpenAiProvider::new(settings.openai.clone())?),
            gemini: Arc::new(GeminiProvider::new(settings.gemini.clone())?),
            ollama: ollama.clone(),
            tesseract: Arc::new(TesseractProvider::new(settings.tesseract.clone())),
        };
        Ok(Self { set, ollama, resolver })
    }
}

//! OCR module.
//!
//! Extracts text from images through a chain of providers:
//! - OpenAI and Gemini hosted vision models
//! - Ollama local LLM server
//! - Tesseract CLI as the terminal fallback
//!
//! Responses that decline the task are detected by [`refusal::is_refusal`]
//! and escalated by [`OcrOrchestrator`] according to the requested
//! [`ProviderFamily`].

pub mod backend;
pub mod image;
pub mod orchestrator;
pub mod providers;
pub mod refusal;
pub mod resolver;

pub use backend::{OcrError, OcrProvider, PromptStyle, ProviderKind, VISION_OCR_PROMPT};
pub use image::{decode_image, ImagePreprocessor, PngImage, StandardPreprocessor};
pub use orchestrator::{
    EscalationPlan, EscalationStep, ImageSource, ModelChoice, OcrOrchestrator, OcrOutcome,
    ProviderFamily, ProviderSet,
};
pub use providers::{
    GeminiProvider, OllamaProvider, OpenAiProvider, ProviderRegistry, TesseractProvider,
};
pub use refusal::is_refusal;
pub use resolver::{EndpointResolver, HttpLivenessCheck, LivenessCheck};

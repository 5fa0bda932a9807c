//! Ollama local LLM provider.
//!
//! Sends a text prompt carrying the base64 PNG to `/api/generate`, embeds via
//! `/api/embeddings`, and manages models via `/api/tags`, `/api/ps` and
//! `/api/pull`. The base URL comes from the shared [`EndpointResolver`].
//!
//! A 404 from generate or embeddings means the model is not installed: the
//! model is pulled once and the original call retried once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{build_client, ensure_success};
use crate::config::OllamaConfig;
use crate::ocr::backend::{OcrError, OcrProvider, PromptStyle, ProviderKind};
use crate::ocr::image::PngImage;
use crate::ocr::resolver::EndpointResolver;

const BACKEND: ProviderKind = ProviderKind::Ollama;

/// First-attempt transcription instruction.
pub const STANDARD_PROMPT: &str =
    "Extract all text from this image (Base64 PNG). Return only the transcribed text, no explanations.\n";

/// Instruction used after a refusal.
pub const INSISTENT_PROMPT: &str = "You must transcribe any readable text from this image (Base64 PNG). \
If no text is present, return an empty string. Return only the text.\n";

/// Build the text-only OCR prompt for a given style.
pub fn ocr_prompt(style: PromptStyle, image_base64: &str) -> String {
    let instruction = match style {
        PromptStyle::Standard => STANDARD_PROMPT,
        PromptStyle::Insistent => INSISTENT_PROMPT,
    };
    format!("{}{}", instruction, image_base64)
}

/// Ollama provider.
pub struct OllamaProvider {
    config: OllamaConfig,
    resolver: Arc<EndpointResolver>,
    client: Client,
    pull_client: Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    name: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig, resolver: Arc<EndpointResolver>) -> Result<Self, OcrError> {
        let client = build_client(BACKEND, Duration::from_secs(config.timeout_secs))?;
        let pull_client = build_client(BACKEND, Duration::from_secs(config.pull_timeout_secs))?;
        Ok(Self {
            config,
            resolver,
            client,
            pull_client,
        })
    }

    fn model<'a>(&'a self, model: Option<&'a str>) -> &'a str {
        model.unwrap_or(&self.config.model)
    }

    /// POST JSON to an endpoint, mapping 404 to `ModelNotFound`.
    async fn post_json<B, R>(&self, path: &str, body: &B, model: &str) -> Result<R, OcrError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let base = self.resolver.resolve().await;
        let url = format!("{}{}", base, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| OcrError::request(BACKEND, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(OcrError::ModelNotFound(model.to_string()));
        }
        let response = ensure_success(BACKEND, response).await?;
        response.json().await.map_err(|e| OcrError::parse(BACKEND, e))
    }

    /// POST with one pull-and-retry if the model is missing.
    async fn post_with_pull<B, R>(&self, path: &str, body: &B, model: &str) -> Result<R, OcrError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        match self.post_json(path, body, model).await {
            Err(OcrError::ModelNotFound(_)) => {
                info!("Ollama model '{}' not found, pulling", model);
                self.pull_model(model).await?;
                self.post_json(path, body, model).await.map_err(|e| match e {
                    OcrError::ModelNotFound(m) => OcrError::Api {
                        backend: BACKEND,
                        status: StatusCode::NOT_FOUND.as_u16(),
                        body: format!("model '{}' still not found after pull", m),
                    },
                    other => other,
                })
            }
            other => other,
        }
    }

    async fn get_models(&self, path: &str) -> Result<Vec<String>, OcrError> {
        let base = self.resolver.resolve().await;
        let response = self
            .client
            .get(format!("{}{}", base, path))
            .send()
            .await
            .map_err(|e| OcrError::request(BACKEND, e))?;
        let response = ensure_success(BACKEND, response).await?;
        let body: ModelsResponse = response
            .json()
            .await
            .map_err(|e| OcrError::parse(BACKEND, e))?;
        Ok(body.models.into_iter().map(|m| m.name).collect())
    }

    /// Models currently loaded in memory (`/api/ps`).
    pub async fn running_models(&self) -> Result<Vec<String>, OcrError> {
        self.get_models("/api/ps").await
    }
}

#[async_trait]
impl OcrProvider for OllamaProvider {
    fn kind(&self) -> ProviderKind {
        BACKEND
    }

    fn default_model(&self) -> Option<&str> {
        Some(&self.config.model)
    }

    async fn extract_text(
        &self,
        image: &PngImage,
        prompt: PromptStyle,
        model: Option<&str>,
    ) -> Result<String, OcrError> {
        let prompt = ocr_prompt(prompt, &image.to_base64());
        self.generate_text(&prompt, model, None).await
    }

    async fn generate_text(
        &self,
        prompt: &str,
        model: Option<&str>,
        _max_tokens: Option<u32>,
    ) -> Result<String, OcrError> {
        let model = self.model(model);
        debug!("Ollama generate: model={}, prompt={} chars", model, prompt.len());
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };
        let response: GenerateResponse = self.post_with_pull("/api/generate", &request, model).await?;
        Ok(response.response)
    }

    async fn embed(&self, text: &str, model: Option<&str>) -> Result<Vec<f32>, OcrError> {
        let model = self.model(model);
        let request = EmbeddingRequest { model, prompt: text };
        let response: EmbeddingResponse = self
            .post_with_pull("/api/embeddings", &request, model)
            .await?;
        Ok(response.embedding)
    }

    async fn list_models(&self) -> Result<Vec<String>, OcrError> {
        self.get_models("/api/tags").await
    }

    async fn pull_model(&self, model: &str) -> Result<(), OcrError> {
        let base = self.resolver.resolve().await;
        let request = PullRequest {
            name: model,
            stream: false,
        };
        let response = self
            .pull_client
            .post(format!("{}/api/pull", base))
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::request(BACKEND, e))?;
        ensure_success(BACKEND, response).await?;
        info!("Pulled Ollama model '{}'", model);
        Ok(())
    }
}

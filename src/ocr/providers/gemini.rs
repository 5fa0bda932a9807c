//! Google Gemini Vision OCR provider.
//!
//! Uses Gemini's generateContent API with inline PNG data.
//! Requires GEMINI_API_KEY.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{build_client, ensure_success, send_with_retry};
use crate::config::GeminiConfig;
use crate::ocr::backend::{OcrError, OcrProvider, PromptStyle, ProviderKind, VISION_OCR_PROMPT};
use crate::ocr::image::PngImage;

const BACKEND: ProviderKind = ProviderKind::Gemini;

/// Gemini provider for OCR and text generation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    #[serde(rename = "mimeType")]
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Option<Vec<GeminiResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

impl GeminiResponse {
    /// All non-empty text parts of all candidates, joined by newlines.
    fn into_text(self) -> String {
        self.candidates
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts.unwrap_or_default())
            .filter_map(|p| p.text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, OcrError> {
        let client = build_client(BACKEND, Duration::from_secs(config.timeout_secs))?;
        Ok(Self { config, client })
    }

    async fn generate(&self, parts: Vec<GeminiPart>, model: Option<&str>) -> Result<String, OcrError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            OcrError::BackendNotAvailable(
                "GEMINI_API_KEY not set. Get an API key from https://ai.google.dev/".to_string(),
            )
        })?;
        let model = model.unwrap_or(&self.config.model);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            model
        );
        let request = GeminiRequest {
            contents: vec![GeminiContent { parts }],
        };

        let response = send_with_retry(BACKEND, || {
            self.client
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&request)
        })
        .await?;
        let response = ensure_success(BACKEND, response).await?;

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| OcrError::parse(BACKEND, e))?;
        Ok(body.into_text())
    }
}

#[async_trait]
impl OcrProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        BACKEND
    }

    fn default_model(&self) -> Option<&str> {
        Some(&self.config.model)
    }

    fn provenance(&self, model: Option<&str>) -> String {
        format!("gemini:{}", model.unwrap_or(&self.config.model))
    }

    async fn extract_text(
        &self,
        image: &PngImage,
        _prompt: PromptStyle,
        model: Option<&str>,
    ) -> Result<String, OcrError> {
        debug!("Gemini OCR: image={} bytes", image.len());
        let parts = vec![
            GeminiPart::Text {
                text: VISION_OCR_PROMPT.to_string(),
            },
            GeminiPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: "image/png",
                    data: image.to_base64(),
                },
            },
        ];
        self.generate(parts, model).await
    }

    async fn generate_text(
        &self,
        prompt: &str,
        model: Option<&str>,
        _max_tokens: Option<u32>,
    ) -> Result<String, OcrError> {
        let parts = vec![GeminiPart::Text {
            text: prompt.to_string(),
        }];
        self.generate(parts, model).await
    }
}

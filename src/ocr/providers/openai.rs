//! OpenAI vision OCR provider.
//!
//! Uses the chat completions API with an inline `data:` image URL, and the
//! embeddings API for vectors. Works with any OpenAI-compatible endpoint.
//! Requires OPENAI_API_KEY.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{build_client, ensure_success, send_with_retry};
use crate::config::OpenAiConfig;
use crate::ocr::backend::{OcrError, OcrProvider, PromptStyle, ProviderKind, VISION_OCR_PROMPT};
use crate::ocr::image::PngImage;

const BACKEND: ProviderKind = ProviderKind::OpenAi;

/// Placeholder sent instead of an empty embedding input.
const EMPTY_INPUT_PLACEHOLDER: &str = " ";

/// OpenAI provider for OCR, text generation and embeddings.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, OcrError> {
        let client = build_client(BACKEND, Duration::from_secs(config.timeout_secs))?;
        Ok(Self { config, client })
    }

    fn api_key(&self) -> Result<&str, OcrError> {
        self.config.api_key.as_deref().ok_or_else(|| {
            OcrError::BackendNotAvailable(
                "OPENAI_API_KEY not set. Create a key at https://platform.openai.com/".to_string(),
            )
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    async fn chat(&self, request: &ChatRequest<'_>) -> Result<String, OcrError> {
        let api_key = self.api_key()?;
        let url = self.url("chat/completions");

        let response = send_with_retry(BACKEND, || {
            self.client.post(&url).bearer_auth(api_key).json(request)
        })
        .await?;
        let response = ensure_success(BACKEND, response).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| OcrError::parse(BACKEND, e))?;

        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl OcrProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        BACKEND
    }

    fn default_model(&self) -> Option<&str> {
        Some(&self.config.model)
    }

    async fn extract_text(
        &self,
        image: &PngImage,
        _prompt: PromptStyle,
        model: Option<&str>,
    ) -> Result<String, OcrError> {
        let model = model.unwrap_or(&self.config.model);
        debug!("OpenAI OCR: model={}, image={} bytes", model, image.len());

        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: VISION_OCR_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_url(),
                        },
                    },
                ]),
            }],
            max_tokens: self.config.max_tokens,
        };
        self.chat(&request).await
    }

    async fn generate_text(
        &self,
        prompt: &str,
        model: Option<&str>,
        max_tokens: Option<u32>,
    ) -> Result<String, OcrError> {
        let request = ChatRequest {
            model: model.unwrap_or(&self.config.model),
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Text(prompt),
            }],
            max_tokens: max_tokens.unwrap_or(self.config.max_tokens),
        };
        self.chat(&request).await
    }

    async fn embed(&self, text: &str, model: Option<&str>) -> Result<Vec<f32>, OcrError> {
        let api_key = self.api_key()?;
        let url = self.url("embeddings");
        let input = if text.is_empty() {
            EMPTY_INPUT_PLACEHOLDER
        } else {
            text
        };
        let request = EmbeddingRequest {
            model: model.unwrap_or(&self.config.embedding_model),
            input,
        };

        let response = send_with_retry(BACKEND, || {
            self.client.post(&url).bearer_auth(api_key).json(&request)
        })
        .await?;
        let response = ensure_success(BACKEND, response).await?;

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| OcrError::parse(BACKEND, e))?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| OcrError::parse(BACKEND, "embedding response had no data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vision_request_shape() {
        let request = ChatRequest {
            model: "gpt-4o",
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: VISION_OCR_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: "data:image/png;base64,AAAA".to_string(),
                        },
                    },
                ]),
            }],
            max_tokens: 1024,
        };

        let json = serde_json::to_value(&request).unwrap();
        let content = &json["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "data:image/png;base64,AAAA");
        assert_eq!(json["max_tokens"], 1024);
    }

    #[test]
    fn test_null_content_parses() {
        let body: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
                .unwrap();
        assert!(body.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn test_missing_key_is_not_available() {
        let provider = OpenAiProvider::new(OpenAiConfig::default()).unwrap();
        let err = provider.embed("hello", None).await.unwrap_err();
        assert!(matches!(err, OcrError::BackendNotAvailable(_)));
    }
}

//! Text summarization through the configured text generators.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ServiceError, ServiceResult};
use crate::ocr::{OcrProvider, ProviderFamily, ProviderSet};
use crate::repository::DbContext;

/// Requested summary length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    Medium,
    Long,
}

impl SummaryLength {
    /// Parse a length, falling back to medium.
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("short") => Self::Short,
            Some("long") => Self::Long,
            _ => Self::Medium,
        }
    }

    fn clause(&self) -> &'static str {
        match self {
            Self::Short => "Keep it very brief: 2-3 sentences OR 3 bullet points maximum.",
            Self::Medium => "Keep it concise: ~4-6 sentences OR 3-5 bullet points.",
            Self::Long => "Provide a detailed summary: 1-2 paragraphs OR 5-8 bullet points.",
        }
    }

    /// Output token cap for hosted chat models.
    pub fn max_tokens(&self) -> u32 {
        match self {
            Self::Short => 250,
            Self::Medium => 400,
            Self::Long => 800,
        }
    }
}

/// Requested summary format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    Bullets,
    Plain,
}

impl SummaryFormat {
    /// Parse a format, falling back to bullets.
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("plain") => Self::Plain,
            _ => Self::Bullets,
        }
    }

    fn clause(&self) -> &'static str {
        match self {
            Self::Bullets => "Return the summary as a bullet point list.",
            Self::Plain => "Return the summary as plain prose text (no bullets).",
        }
    }
}

/// Summarization request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummarizeRequest {
    pub text_id: Option<i32>,
    pub text: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub summary_length: Option<String>,
    pub format: Option<String>,
    pub instructions: Option<String>,
    pub project_id: Option<i32>,
    #[serde(default)]
    pub summarize_all: bool,
}

/// A generated summary.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub summary: String,
    pub provider: String,
    pub length: SummaryLength,
    pub format: SummaryFormat,
}

/// Build the instruction that precedes the source text.
pub fn build_prompt_header(length: SummaryLength, format: SummaryFormat, instructions: Option<&str>) -> String {
    let extra = instructions
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!(" Additional guidance: {}", s))
        .unwrap_or_default();
    format!(
        "Summarize the following text. {} {}{}\n\nTEXT:\n",
        length.clause(),
        format.clause(),
        extra
    )
}

pub struct SummarizeService {
    providers: ProviderSet,
    db: DbContext,
    default_provider: String,
}

impl SummarizeService {
    pub fn new(providers: ProviderSet, db: DbContext, default_provider: impl Into<String>) -> Self {
        Self {
            providers,
            db,
            default_provider: default_provider.into(),
        }
    }

    async fn source_text(&self, request: &SummarizeRequest) -> ServiceResult<String> {
        if let Some(ref text) = request.text {
            return Ok(text.clone());
        }

        if request.summarize_all {
            let texts: Vec<String> = self
                .db
                .texts()
                .list_oldest_first(request.project_id)
                .await?
                .into_iter()
                .map(|t| t.text)
                .filter(|t| !t.is_empty())
                .collect();
            if texts.is_empty() {
                return Err(ServiceError::NotFound("No texts found to summarize".to_string()));
            }
            return Ok(texts.join("\n\n"));
        }

        match request.text_id {
            Some(id) => self
                .db
                .texts()
                .get(id)
                .await?
                .map(|t| t.text)
                .ok_or_else(|| ServiceError::NotFound("Text not found".to_string())),
            None => Err(ServiceError::InvalidInput(
                "Provide text_id, text, or set summarize_all=true".to_string(),
            )),
        }
    }

    pub async fn summarize(&self, request: &SummarizeRequest) -> ServiceResult<Summary> {
        let length = SummaryLength::parse(request.summary_length.as_deref());
        let format = SummaryFormat::parse(request.format.as_deref());
        let source = self.source_text(request).await?;

        let selector = request.provider.as_deref().unwrap_or(&self.default_provider);
        let family = ProviderFamily::from_selector(Some(selector));
        let provider: &Arc<dyn OcrProvider> = self.providers.for_family(family);
        let model = request
            .model
            .as_deref()
            .or_else(|| provider.default_model())
            .map(str::to_string);

        let prompt = format!(
            "{}{}",
            build_prompt_header(length, format, request.instructions.as_deref()),
            source
        );
        let summary = provider
            .generate_text(&prompt, model.as_deref(), Some(length.max_tokens()))
            .await?;

        let provider_tag = match model {
            Some(m) => format!("{}:{}", family.as_str(), m),
            None => family.as_str().to_string(),
        };
        info!("Summarized {} chars via {}", source.len(), provider_tag);

        Ok(Summary {
            summary,
            provider: provider_tag,
            length,
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_header() {
        let header = build_prompt_header(SummaryLength::Short, SummaryFormat::Plain, Some("  focus on dates "));
        assert_eq!(
            header,
            "Summarize the following text. Keep it very brief: 2-3 sentences OR 3 bullet points maximum. \
             Return the summary as plain prose text (no bullets). Additional guidance: focus on dates\n\nTEXT:\n"
        );

        let header = build_prompt_header(SummaryLength::Medium, SummaryFormat::Bullets, Some("   "));
        assert!(header.ends_with("Return the summary as a bullet point list.\n\nTEXT:\n"));
    }

    #[test]
    fn test_length_and_format_defaults() {
        assert_eq!(SummaryLength::parse(None), SummaryLength::Medium);
        assert_eq!(SummaryLength::parse(Some("LONG")), SummaryLength::Long);
        assert_eq!(SummaryLength::parse(Some("epic")), SummaryLength::Medium);
        assert_eq!(SummaryFormat::parse(Some("plain")), SummaryFormat::Plain);
        assert_eq!(SummaryFormat::parse(Some("table")), SummaryFormat::Bullets);
        assert_eq!(SummaryLength::Long.max_tokens(), 800);
    }
}

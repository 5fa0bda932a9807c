//! Service layer for Scrivener business logic.
//!
//! Services sit between the interfaces (CLI, HTTP server) and the
//! pipeline and repositories, and share one error type.

pub mod analytics;
pub mod models;
pub mod ocr;
pub mod projects;
pub mod summarize;

use std::sync::Arc;

use thiserror::Error;

use crate::config::Settings;
use crate::embedding::EmbeddingClient;
use crate::ocr::{
    ImagePreprocessor, OcrError, OcrOrchestrator, OllamaProvider, ProviderRegistry, ProviderSet,
    StandardPreprocessor,
};
use crate::pipeline::ExtractionPipeline;
use crate::repository::util::is_unique_violation;
use crate::repository::DbContext;

pub use analytics::AnalyticsService;
pub use models::LocalModelService;
pub use ocr::{OcrService, ProcessedText};
pub use projects::ProjectService;
pub use summarize::{SummarizeRequest, SummarizeService, Summary, SummaryFormat, SummaryLength};

/// Errors from the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl ServiceError {
    /// Map a provider error, treating undecodable images as bad input.
    pub fn from_ocr(e: OcrError) -> Self {
        match e {
            OcrError::Image(msg) => ServiceError::InvalidInput(format!("Invalid image: {}", msg)),
            other => ServiceError::Ocr(other),
        }
    }

    /// Map a database error from an insert, turning UNIQUE violations into
    /// bad input with the given message.
    pub fn from_insert(e: diesel::result::Error, duplicate_message: &str) -> Self {
        if is_unique_violation(&e) {
            ServiceError::InvalidInput(duplicate_message.to_string())
        } else {
            ServiceError::Database(e)
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Every service, wired to one database and one set of providers.
#[derive(Clone)]
pub struct Services {
    pub db: DbContext,
    pub ocr: Arc<OcrService>,
    pub projects: Arc<ProjectService>,
    pub summarize: Arc<SummarizeService>,
    pub analytics: Arc<AnalyticsService>,
    pub models: Arc<LocalModelService>,
}

impl Services {
    /// Open the database, create tables and build the real providers.
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        settings.ensure_directories()?;
        let db = DbContext::from_url(&settings.database_url());
        db.init_schema().await?;

        let registry = ProviderRegistry::from_settings(settings)?;
        Ok(Self::assemble(
            settings,
            db,
            registry.set.clone(),
            registry.ollama.clone(),
            Arc::new(StandardPreprocessor::default()),
        ))
    }

    /// Wire services around explicit providers.
    pub fn assemble(
        settings: &Settings,
        db: DbContext,
        providers: ProviderSet,
        ollama: Arc<OllamaProvider>,
        preprocessor: Arc<dyn ImagePreprocessor>,
    ) -> Self {
        let embeddings = EmbeddingClient::new(providers.openai.clone(), providers.ollama.clone());
        let orchestrator = Arc::new(OcrOrchestrator::new(providers.clone(), preprocessor));
        let pipeline = ExtractionPipeline::new(orchestrator, embeddings)
            .with_default_provider(settings.default_provider.clone());

        Self {
            ocr: Arc::new(OcrService::new(pipeline, db.clone(), settings.similarity_top_k)),
            projects: Arc::new(ProjectService::new(db.clone())),
            summarize: Arc::new(SummarizeService::new(
                providers,
                db.clone(),
                settings.default_provider.clone(),
            )),
            analytics: Arc::new(AnalyticsService::new(db.clone())),
            models: Arc::new(LocalModelService::new(ollama)),
            db,
        }
    }
}

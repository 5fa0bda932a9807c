//! Ollama adapter tests against an in-process mock server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use image::{DynamicImage, Rgb, RgbImage};
use serde_json::{json, Value};

use scrivener::config::OllamaConfig;
use scrivener::ocr::{
    EndpointResolver, LivenessCheck, OcrError, OcrOrchestrator, OcrProvider, OllamaProvider,
    PngImage, PromptStyle, ProviderFamily, ProviderKind, ProviderSet, StandardPreprocessor,
};

#[derive(Default)]
struct MockOllama {
    /// Whether `/api/pull` installs the model.
    pull_installs: bool,
    installed: Mutex<bool>,
    generate_calls: AtomicUsize,
    pull_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

async fn tags() -> Json<Value> {
    Json(json!({"models": [{"name": "llama3:latest"}, {"name": "llava:13b"}]}))
}

async fn ps() -> Json<Value> {
    Json(json!({"models": [{"name": "llava:13b"}]}))
}

async fn generate(State(mock): State<Arc<MockOllama>>, Json(body): Json<Value>) -> Response {
    mock.generate_calls.fetch_add(1, Ordering::SeqCst);
    mock.prompts
        .lock()
        .unwrap()
        .push(body["prompt"].as_str().unwrap_or_default().to_string());
    if !*mock.installed.lock().unwrap() {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "model not found"}))).into_response();
    }
    Json(json!({"response": "Pick up the kids at 4", "done": true})).into_response()
}

async fn embeddings(State(mock): State<Arc<MockOllama>>) -> Response {
    if !*mock.installed.lock().unwrap() {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({"embedding": [0.5, 0.5]})).into_response()
}

async fn pull(State(mock): State<Arc<MockOllama>>, Json(body): Json<Value>) -> Json<Value> {
    mock.pull_calls.fetch_add(1, Ordering::SeqCst);
    assert_eq!(body["stream"], false);
    if mock.pull_installs {
        *mock.installed.lock().unwrap() = true;
    }
    Json(json!({"status": "success"}))
}

async fn spawn_mock(mock: Arc<MockOllama>) -> String {
    let app = Router::new()
        .route("/api/tags", get(tags))
        .route("/api/ps", get(ps))
        .route("/api/generate", post(generate))
        .route("/api/embeddings", post(embeddings))
        .route("/api/pull", post(pull))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Liveness check that only accepts one base URL and counts every call.
struct CountingCheck {
    alive: String,
    calls: AtomicUsize,
}

#[async_trait]
impl LivenessCheck for CountingCheck {
    async fn is_alive(&self, base_url: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        base_url == self.alive
    }
}

fn provider(base: &str, liveness: Arc<CountingCheck>) -> Arc<OllamaProvider> {
    let config = OllamaConfig {
        endpoint: base.to_string(),
        ..Default::default()
    };
    let resolver = Arc::new(EndpointResolver::new(base, &[], liveness));
    Arc::new(OllamaProvider::new(config, resolver).unwrap())
}

fn counting_check(base: &str) -> Arc<CountingCheck> {
    Arc::new(CountingCheck {
        alive: base.to_string(),
        calls: AtomicUsize::new(0),
    })
}

fn page() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])))
}

/// Stand-in for providers the local plan never reaches.
struct Unreachable(ProviderKind);

#[async_trait]
impl OcrProvider for Unreachable {
    fn kind(&self) -> ProviderKind {
        self.0
    }

    async fn extract_text(
        &self,
        _image: &PngImage,
        _prompt: PromptStyle,
        _model: Option<&str>,
    ) -> Result<String, OcrError> {
        panic!("{} should not be called", self.0);
    }
}

#[tokio::test]
async fn test_missing_model_is_pulled_then_retried_once() {
    let mock = Arc::new(MockOllama {
        pull_installs: true,
        ..Default::default()
    });
    let base = spawn_mock(mock.clone()).await;
    let ollama = provider(&base, counting_check(&base));

    let text = ollama.generate_text("hello", None, None).await.unwrap();
    assert_eq!(text, "Pick up the kids at 4");
    assert_eq!(mock.pull_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.generate_calls.load(Ordering::SeqCst), 2);

    // Installed now, so no further pulls.
    ollama.generate_text("again", None, None).await.unwrap();
    assert_eq!(mock.pull_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.generate_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_still_missing_after_pull_is_an_api_error() {
    let mock = Arc::new(MockOllama::default());
    let base = spawn_mock(mock.clone()).await;
    let ollama = provider(&base, counting_check(&base));

    let err = ollama.generate_text("hello", Some("ghost"), None).await.unwrap_err();
    match err {
        OcrError::Api { backend, status, .. } => {
            assert_eq!(backend, ProviderKind::Ollama);
            assert_eq!(status, 404);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(mock.pull_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.generate_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_model_listing_and_embeddings() {
    let mock = Arc::new(MockOllama {
        pull_installs: true,
        ..Default::default()
    });
    let base = spawn_mock(mock.clone()).await;
    let ollama = provider(&base, counting_check(&base));

    assert_eq!(ollama.list_models().await.unwrap(), vec!["llama3:latest", "llava:13b"]);
    assert_eq!(ollama.running_models().await.unwrap(), vec!["llava:13b"]);
    assert_eq!(ollama.embed("text", None).await.unwrap(), vec![0.5, 0.5]);
    assert_eq!(mock.pull_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_endpoint_is_resolved_once_across_requests() {
    let mock = Arc::new(MockOllama {
        pull_installs: true,
        ..Default::default()
    });
    *mock.installed.lock().unwrap() = true;
    let base = spawn_mock(mock.clone()).await;
    let liveness = counting_check(&base);
    let ollama = provider(&base, liveness.clone());

    let set = ProviderSet {
        openai: Arc::new(Unreachable(ProviderKind::OpenAi)),
        gemini: Arc::new(Unreachable(ProviderKind::Gemini)),
        ollama,
        tesseract: Arc::new(Unreachable(ProviderKind::Tesseract)),
    };
    let orchestrator = OcrOrchestrator::new(set, Arc::new(StandardPreprocessor::default()));

    for _ in 0..2 {
        let outcome = orchestrator.run(page(), ProviderFamily::Local, None).await.unwrap();
        assert_eq!(outcome.text, "Pick up the kids at 4");
        assert_eq!(outcome.provider, "ollama");
    }

    assert_eq!(liveness.calls.load(Ordering::SeqCst), 1);
    let prompts = mock.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].starts_with("Extract all text from this image"));
}

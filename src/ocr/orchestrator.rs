//! OCR escalation state machine.
//!
//! Each provider family maps to an [`EscalationPlan`]: an ordered list of
//! refusable attempts followed by one terminal attempt on the deterministic
//! engine. A single loop walks the plan; a refusal advances to the next step,
//! any provider error aborts the request. The terminal step is a separate
//! field so every plan ends with a provider whose text is accepted as-is.

use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, info, warn};

use super::backend::{OcrError, OcrProvider, PromptStyle};
use super::image::{ImagePreprocessor, PngImage};
use super::refusal::is_refusal;

/// Suffix appended to the provenance of text read from a preprocessed image.
pub const PREPROCESS_SUFFIX: &str = "+preprocess";

/// Which escalation chain a request follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    /// Primary hosted vision model (OpenAI). Also the default.
    Primary,
    /// Secondary hosted vision model (Gemini).
    Secondary,
    /// Local LLM server (Ollama).
    Local,
}

impl ProviderFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "openai",
            Self::Secondary => "gemini",
            Self::Local => "ollama",
        }
    }

    /// Map a request's provider selector to a family.
    ///
    /// Unknown or missing selectors fall back to the primary family.
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("ollama") | Some("local") | Some("local-llm") => Self::Local,
            Some("gemini") | Some("cloud-vision-llm-secondary") => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

impl std::fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which image an attempt reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Original,
    Preprocessed,
}

/// Which model an attempt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    /// The request's model override, if any.
    Requested,
    /// The provider's configured default.
    ProviderDefault,
}

/// One refusable attempt.
#[derive(Clone)]
pub struct EscalationStep {
    pub provider: Arc<dyn OcrProvider>,
    pub image: ImageSource,
    pub prompt: PromptStyle,
    pub model: ModelChoice,
}

impl EscalationStep {
    fn new(provider: &Arc<dyn OcrProvider>, image: ImageSource, prompt: PromptStyle, model: ModelChoice) -> Self {
        Self {
            provider: Arc::clone(provider),
            image,
            prompt,
            model,
        }
    }
}

impl std::fmt::Debug for EscalationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscalationStep")
            .field("provider", &self.provider.kind())
            .field("image", &self.image)
            .field("prompt", &self.prompt)
            .field("model", &self.model)
            .finish()
    }
}

/// Ordered attempts plus the terminal fallback.
#[derive(Clone)]
pub struct EscalationPlan {
    pub steps: Vec<EscalationStep>,
    /// Deterministic engine, always run on the preprocessed image.
    pub terminal: Arc<dyn OcrProvider>,
}

/// The providers an orchestrator can draw on.
#[derive(Clone)]
pub struct ProviderSet {
    pub openai: Arc<dyn OcrProvider>,
    pub gemini: Arc<dyn OcrProvider>,
    pub ollama: Arc<dyn OcrProvider>,
    pub tesseract: Arc<dyn OcrProvider>,
}

impl ProviderSet {
    /// The provider that owns a family's first attempt.
    pub fn for_family(&self, family: ProviderFamily) -> &Arc<dyn OcrProvider> {
        match family {
            ProviderFamily::Primary => &self.openai,
            ProviderFamily::Secondary => &self.gemini,
            ProviderFamily::Local => &self.ollama,
        }
    }

    /// Build the escalation plan for a family.
    pub fn plan(&self, family: ProviderFamily) -> EscalationPlan {
        use ImageSource::{Original, Preprocessed};
        use ModelChoice::{ProviderDefault, Requested};
        use PromptStyle::{Insistent, Standard};

        let steps = match family {
            ProviderFamily::Local => vec![
                EscalationStep::new(&self.ollama, Original, Standard, Requested),
                EscalationStep::new(&self.ollama, Original, Insistent, Requested),
                EscalationStep::new(&self.openai, Preprocessed, Standard, ProviderDefault),
            ],
            ProviderFamily::Secondary => vec![
                EscalationStep::new(&self.gemini, Original, Standard, Requested),
                EscalationStep::new(&self.gemini, Preprocessed, Standard, Requested),
            ],
            ProviderFamily::Primary => vec![
                EscalationStep::new(&self.openai, Original, Standard, Requested),
                EscalationStep::new(&self.openai, Preprocessed, Standard, Requested),
            ],
        };

        EscalationPlan {
            steps,
            terminal: Arc::clone(&self.tesseract),
        }
    }
}

/// Accepted text and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOutcome {
    pub text: String,
    pub provider: String,
}

/// Images for one request: the original is encoded up front, the
/// preprocessed one at most once, on first use.
struct RequestImages {
    source: Arc<DynamicImage>,
    original: PngImage,
    preprocessed: Option<PngImage>,
}

/// Runs escalation plans.
pub struct OcrOrchestrator {
    providers: ProviderSet,
    preprocessor: Arc<dyn ImagePreprocessor>,
}

impl OcrOrchestrator {
    pub fn new(providers: ProviderSet, preprocessor: Arc<dyn ImagePreprocessor>) -> Self {
        Self {
            providers,
            preprocessor,
        }
    }

    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    /// Extract text from an image using the family's escalation plan.
    ///
    /// Terminates with some text (possibly empty) unless a provider call
    /// fails, in which case that error is returned unchanged.
    pub async fn run(
        &self,
        image: DynamicImage,
        family: ProviderFamily,
        model: Option<&str>,
    ) -> Result<OcrOutcome, OcrError> {
        let plan = self.providers.plan(family);
        self.execute(&plan, image, model).await
    }

    /// Walk a plan until a step returns a non-refusal.
    pub async fn execute(
        &self,
        plan: &EscalationPlan,
        image: DynamicImage,
        model: Option<&str>,
    ) -> Result<OcrOutcome, OcrError> {
        let original = PngImage::from_dynamic(&image)?;
        let mut images = RequestImages {
            source: Arc::new(image),
            original,
            preprocessed: None,
        };

        for (index, step) in plan.steps.iter().enumerate() {
            let step_model = match step.model {
                ModelChoice::Requested => model,
                ModelChoice::ProviderDefault => None,
            };
            debug!(
                "OCR attempt {}: provider={}, image={:?}, prompt={:?}",
                index + 1,
                step.provider.kind(),
                step.image,
                step.prompt
            );

            let png = self.image_for(&mut images, step.image).await?;
            let text = step.provider.extract_text(png, step.prompt, step_model).await?;

            if !is_refusal(&text) {
                let mut provider = step.provider.provenance(step_model);
                if step.image == ImageSource::Preprocessed {
                    provider.push_str(PREPROCESS_SUFFIX);
                }
                info!("OCR accepted from {} ({} chars)", provider, text.len());
                return Ok(OcrOutcome { text, provider });
            }

            warn!(
                "OCR attempt {} refused by {}, escalating",
                index + 1,
                step.provider.kind()
            );
        }

        let png = self.image_for(&mut images, ImageSource::Preprocessed).await?;
        let text = plan
            .terminal
            .extract_text(png, PromptStyle::Standard, None)
            .await?;
        let provider = plan.terminal.provenance(None);
        info!("OCR fell back to {} ({} chars)", provider, text.len());
        Ok(OcrOutcome { text, provider })
    }

    async fn image_for<'a>(
        &self,
        images: &'a mut RequestImages,
        source: ImageSource,
    ) -> Result<&'a PngImage, OcrError> {
        match source {
            ImageSource::Original => Ok(&images.original),
            ImageSource::Preprocessed => {
                if images.preprocessed.is_none() {
                    let preprocessor = Arc::clone(&self.preprocessor);
                    let source = Arc::clone(&images.source);
                    let png = tokio::task::spawn_blocking(move || {
                        PngImage::from_dynamic(&preprocessor.preprocess(&source))
                    })
                    .await
                    .map_err(|e| OcrError::Image(format!("preprocessing task failed: {}", e)))??;
                    images.preprocessed = Some(png);
                }
                match &images.preprocessed {
                    Some(png) => Ok(png),
                    None => Err(OcrError::Image("preprocessed image missing".to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::backend::ProviderKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const REFUSAL: &str = "I'm sorry, I can't help with that.";

    /// Provider that replays scripted responses and records each call.
    struct ScriptedProvider {
        kind: ProviderKind,
        terminal: bool,
        responses: Mutex<Vec<Result<String, OcrError>>>,
        calls: Mutex<Vec<(PromptStyle, Option<String>, usize)>>,
    }

    impl ScriptedProvider {
        fn new(kind: ProviderKind, responses: Vec<Result<String, OcrError>>) -> Arc<Self> {
            Arc::new(Self {
                kind,
                terminal: kind == ProviderKind::Tesseract,
                responses: Mutex::new(responses.into_iter().rev().collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn refusing(kind: ProviderKind) -> Arc<Self> {
            Self::new(kind, (0..4).map(|_| Ok(REFUSAL.to_string())).collect())
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl OcrProvider for ScriptedProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn default_model(&self) -> Option<&str> {
            Some("default-model")
        }

        fn provenance(&self, model: Option<&str>) -> String {
            match self.kind {
                ProviderKind::Gemini => format!("gemini:{}", model.unwrap_or("default-model")),
                other => other.as_str().to_string(),
            }
        }

        fn is_terminal(&self) -> bool {
            self.terminal
        }

        async fn extract_text(
            &self,
            image: &PngImage,
            prompt: PromptStyle,
            model: Option<&str>,
        ) -> Result<String, OcrError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt, model.map(str::to_string), image.len()));
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    /// Preprocessor that counts invocations and inverts the image.
    #[derive(Default)]
    struct CountingPreprocessor {
        calls: AtomicUsize,
    }

    impl ImagePreprocessor for CountingPreprocessor {
        fn preprocess(&self, image: &DynamicImage) -> DynamicImage {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut gray = image.to_luma8();
            image::imageops::invert(&mut gray);
            DynamicImage::ImageLuma8(gray)
        }
    }

    struct Harness {
        openai: Arc<ScriptedProvider>,
        gemini: Arc<ScriptedProvider>,
        ollama: Arc<ScriptedProvider>,
        tesseract: Arc<ScriptedProvider>,
        preprocessor: Arc<CountingPreprocessor>,
        orchestrator: OcrOrchestrator,
    }

    fn harness(
        openai: Arc<ScriptedProvider>,
        gemini: Arc<ScriptedProvider>,
        ollama: Arc<ScriptedProvider>,
        tesseract: Arc<ScriptedProvider>,
    ) -> Harness {
        let preprocessor = Arc::new(CountingPreprocessor::default());
        let providers = ProviderSet {
            openai: openai.clone(),
            gemini: gemini.clone(),
            ollama: ollama.clone(),
            tesseract: tesseract.clone(),
        };
        let orchestrator = OcrOrchestrator::new(providers, preprocessor.clone());
        Harness {
            openai,
            gemini,
            ollama,
            tesseract,
            preprocessor,
            orchestrator,
        }
    }

    fn ok(text: &str) -> Result<String, OcrError> {
        Ok(text.to_string())
    }

    fn sample_image() -> DynamicImage {
        let gray = image::GrayImage::from_fn(16, 16, |x, y| image::Luma([((x * 13 + y * 7) % 256) as u8]));
        DynamicImage::ImageLuma8(gray)
    }

    fn tesseract_with(text: &str) -> Arc<ScriptedProvider> {
        ScriptedProvider::new(ProviderKind::Tesseract, vec![ok(text)])
    }

    #[test]
    fn test_family_selectors() {
        assert_eq!(ProviderFamily::from_selector(Some("ollama")), ProviderFamily::Local);
        assert_eq!(ProviderFamily::from_selector(Some("local-llm")), ProviderFamily::Local);
        assert_eq!(ProviderFamily::from_selector(Some(" Gemini ")), ProviderFamily::Secondary);
        assert_eq!(
            ProviderFamily::from_selector(Some("cloud-vision-llm-secondary")),
            ProviderFamily::Secondary
        );
        assert_eq!(ProviderFamily::from_selector(Some("openai")), ProviderFamily::Primary);
        assert_eq!(ProviderFamily::from_selector(Some("mystery")), ProviderFamily::Primary);
        assert_eq!(ProviderFamily::from_selector(None), ProviderFamily::Primary);
    }

    #[tokio::test]
    async fn test_primary_accepts_first_answer() {
        let h = harness(
            ScriptedProvider::new(ProviderKind::OpenAi, vec![ok("Dear diary")]),
            ScriptedProvider::refusing(ProviderKind::Gemini),
            ScriptedProvider::refusing(ProviderKind::Ollama),
            tesseract_with("unused"),
        );

        let outcome = h
            .orchestrator
            .run(sample_image(), ProviderFamily::Primary, None)
            .await
            .unwrap();
        assert_eq!(outcome.text, "Dear diary");
        assert_eq!(outcome.provider, "openai");
        assert_eq!(h.preprocessor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.tesseract.call_count(), 0);
    }

    #[tokio::test]
    async fn test_primary_always_refusing_escalates_once_each() {
        let h = harness(
            ScriptedProvider::refusing(ProviderKind::OpenAi),
            ScriptedProvider::refusing(ProviderKind::Gemini),
            ScriptedProvider::refusing(ProviderKind::Ollama),
            tesseract_with("shopping list"),
        );

        let outcome = h
            .orchestrator
            .run(sample_image(), ProviderFamily::Primary, None)
            .await
            .unwrap();
        assert_eq!(outcome.text, "shopping list");
        assert_eq!(outcome.provider, "tesseract");
        assert_eq!(h.preprocessor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.openai.call_count(), 2);
        assert_eq!(h.tesseract.call_count(), 1);
        assert_eq!(h.gemini.call_count(), 0);
        assert_eq!(h.ollama.call_count(), 0);
    }

    #[tokio::test]
    async fn test_primary_preprocessed_success_skips_tesseract() {
        let h = harness(
            ScriptedProvider::new(ProviderKind::OpenAi, vec![ok(REFUSAL), ok("faded ink")]),
            ScriptedProvider::refusing(ProviderKind::Gemini),
            ScriptedProvider::refusing(ProviderKind::Ollama),
            tesseract_with("unused"),
        );

        let outcome = h
            .orchestrator
            .run(sample_image(), ProviderFamily::Primary, None)
            .await
            .unwrap();
        assert_eq!(outcome.provider, "openai+preprocess");
        assert_eq!(outcome.text, "faded ink");
        assert_eq!(h.preprocessor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.tesseract.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_answer_is_treated_as_refusal() {
        let h = harness(
            ScriptedProvider::new(ProviderKind::OpenAi, vec![ok(""), ok("")]),
            ScriptedProvider::refusing(ProviderKind::Gemini),
            ScriptedProvider::refusing(ProviderKind::Ollama),
            tesseract_with(""),
        );

        let outcome = h
            .orchestrator
            .run(sample_image(), ProviderFamily::Primary, None)
            .await
            .unwrap();
        assert_eq!(outcome.text, "");
        assert_eq!(outcome.provider, "tesseract");
    }

    #[tokio::test]
    async fn test_whitespace_answer_is_accepted() {
        let h = harness(
            ScriptedProvider::new(ProviderKind::OpenAi, vec![ok("\n")]),
            ScriptedProvider::refusing(ProviderKind::Gemini),
            ScriptedProvider::refusing(ProviderKind::Ollama),
            tesseract_with("unused"),
        );

        let outcome = h
            .orchestrator
            .run(sample_image(), ProviderFamily::Primary, None)
            .await
            .unwrap();
        assert_eq!(outcome.text, "\n");
        assert_eq!(outcome.provider, "openai");
        assert_eq!(h.openai.call_count(), 1);
        assert_eq!(h.preprocessor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.tesseract.call_count(), 0);
    }

    #[tokio::test]
    async fn test_local_family_order_and_prompts() {
        let h = harness(
            ScriptedProvider::refusing(ProviderKind::OpenAi),
            ScriptedProvider::refusing(ProviderKind::Gemini),
            ScriptedProvider::refusing(ProviderKind::Ollama),
            tesseract_with("backstop"),
        );

        let outcome = h
            .orchestrator
            .run(sample_image(), ProviderFamily::Local, Some("llava"))
            .await
            .unwrap();
        assert_eq!(outcome.provider, "tesseract");

        let ollama_calls = h.ollama.calls.lock().unwrap().clone();
        assert_eq!(ollama_calls.len(), 2);
        assert_eq!(ollama_calls[0].0, PromptStyle::Standard);
        assert_eq!(ollama_calls[1].0, PromptStyle::Insistent);
        assert_eq!(ollama_calls[0].1.as_deref(), Some("llava"));
        assert_eq!(ollama_calls[0].2, ollama_calls[1].2, "both attempts read the original image");

        let openai_calls = h.openai.calls.lock().unwrap().clone();
        assert_eq!(openai_calls.len(), 1);
        assert_eq!(openai_calls[0].1, None, "cross-family step uses its own default model");

        assert_eq!(h.preprocessor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.tesseract.call_count(), 1);
    }

    #[tokio::test]
    async fn test_local_family_insistent_retry_succeeds() {
        let h = harness(
            ScriptedProvider::refusing(ProviderKind::OpenAi),
            ScriptedProvider::refusing(ProviderKind::Gemini),
            ScriptedProvider::new(ProviderKind::Ollama, vec![ok(REFUSAL), ok("meeting at noon")]),
            tesseract_with("unused"),
        );

        let outcome = h
            .orchestrator
            .run(sample_image(), ProviderFamily::Local, None)
            .await
            .unwrap();
        assert_eq!(outcome.provider, "ollama");
        assert_eq!(outcome.text, "meeting at noon");
        assert_eq!(h.preprocessor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.openai.call_count(), 0);
    }

    #[tokio::test]
    async fn test_local_family_cloud_rescue_is_tagged_preprocess() {
        let h = harness(
            ScriptedProvider::new(ProviderKind::OpenAi, vec![ok("rescued")]),
            ScriptedProvider::refusing(ProviderKind::Gemini),
            ScriptedProvider::refusing(ProviderKind::Ollama),
            tesseract_with("unused"),
        );

        let outcome = h
            .orchestrator
            .run(sample_image(), ProviderFamily::Local, None)
            .await
            .unwrap();
        assert_eq!(outcome.provider, "openai+preprocess");
        assert_eq!(h.tesseract.call_count(), 0);
    }

    #[tokio::test]
    async fn test_secondary_family_tags_model() {
        let h = harness(
            ScriptedProvider::refusing(ProviderKind::OpenAi),
            ScriptedProvider::new(ProviderKind::Gemini, vec![ok(REFUSAL), ok("postcard")]),
            ScriptedProvider::refusing(ProviderKind::Ollama),
            tesseract_with("unused"),
        );

        let outcome = h
            .orchestrator
            .run(sample_image(), ProviderFamily::Secondary, Some("gemini-1.5-pro"))
            .await
            .unwrap();
        assert_eq!(outcome.provider, "gemini:gemini-1.5-pro+preprocess");
        assert_eq!(h.openai.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_error_propagates_without_escalation() {
        let h = harness(
            ScriptedProvider::new(
                ProviderKind::OpenAi,
                vec![Err(OcrError::Api {
                    backend: ProviderKind::OpenAi,
                    status: 500,
                    body: "boom".to_string(),
                })],
            ),
            ScriptedProvider::refusing(ProviderKind::Gemini),
            ScriptedProvider::refusing(ProviderKind::Ollama),
            tesseract_with("unused"),
        );

        let err = h
            .orchestrator
            .run(sample_image(), ProviderFamily::Primary, None)
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Api { status: 500, .. }));
        assert_eq!(h.openai.call_count(), 1);
        assert_eq!(h.tesseract.call_count(), 0);
        assert_eq!(h.preprocessor.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_every_plan_ends_with_terminal_provider() {
        let h = harness(
            ScriptedProvider::refusing(ProviderKind::OpenAi),
            ScriptedProvider::refusing(ProviderKind::Gemini),
            ScriptedProvider::refusing(ProviderKind::Ollama),
            tesseract_with(""),
        );
        for family in [ProviderFamily::Primary, ProviderFamily::Secondary, ProviderFamily::Local] {
            let plan = h.orchestrator.providers().plan(family);
            assert!(plan.terminal.is_terminal());
            assert!(plan.steps.iter().all(|s| !s.provider.is_terminal()));
        }
    }
}

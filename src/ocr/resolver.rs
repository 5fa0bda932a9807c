//! Base URL resolution for the local Ollama server.
//!
//! Ollama may be reachable under different hostnames depending on where the
//! backend runs (host, container, compose network). The resolver checks a
//! fixed ordered candidate list once and caches the first live base URL for
//! the rest of the process. One resolver is built at startup and shared by
//! reference with every adapter that needs it.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

/// Well-known Ollama base URLs, tried after the configured one.
pub const DEFAULT_OLLAMA_CANDIDATES: &[&str] = &[
    "http://localhost:11434",
    "http://127.0.0.1:11434",
    "http://host.docker.internal:11434",
    "http://ollama:11434",
];

/// Liveness check against a candidate base URL.
#[async_trait]
pub trait LivenessCheck: Send + Sync {
    async fn is_alive(&self, base_url: &str) -> bool;
}

/// Check that lists models (`GET /api/tags`) with a short timeout.
pub struct HttpLivenessCheck {
    client: Client,
}

impl HttpLivenessCheck {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

#[async_trait]
impl LivenessCheck for HttpLivenessCheck {
    async fn is_alive(&self, base_url: &str) -> bool {
        let url = format!("{}/api/tags", base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Ollama liveness check {} failed: {}", base_url, e);
                false
            }
        }
    }
}

/// Resolves and caches the Ollama base URL.
pub struct EndpointResolver {
    candidates: Vec<String>,
    liveness: Arc<dyn LivenessCheck>,
    resolved: OnceLock<String>,
}

impl EndpointResolver {
    /// Create a resolver trying `configured` first, then the defaults,
    /// then `extra`. Duplicates are dropped, order is preserved.
    pub fn new(configured: &str, extra: &[String], liveness: Arc<dyn LivenessCheck>) -> Self {
        let mut candidates: Vec<String> = Vec::new();
        let all = std::iter::once(configured.to_string())
            .chain(DEFAULT_OLLAMA_CANDIDATES.iter().map(|s| s.to_string()))
            .chain(extra.iter().cloned());
        for candidate in all {
            let candidate = candidate.trim().trim_end_matches('/').to_string();
            if !candidate.is_empty() && !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }

        Self {
            candidates,
            liveness,
            resolved: OnceLock::new(),
        }
    }

    /// Resolver with the default HTTP check.
    pub fn with_http_check(configured: &str, extra: &[String], timeout: Duration) -> Self {
        Self::new(configured, extra, Arc::new(HttpLivenessCheck::new(timeout)))
    }

    /// Candidate base URLs in the order they are tried.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// The cached base URL, if one has been resolved.
    pub fn cached(&self) -> Option<&str> {
        self.resolved.get().map(String::as_str)
    }

    /// Resolve the base URL, checking candidates only until the first success.
    ///
    /// Concurrent first-time resolutions may each check; whichever stores
    /// first wins and every caller then sees that value. When nothing
    /// answers, the configured URL is returned uncached so the caller's
    /// request fails as a transport error and a later call can retry.
    pub async fn resolve(&self) -> String {
        if let Some(url) = self.resolved.get() {
            return url.clone();
        }

        for candidate in &self.candidates {
            if self.liveness.is_alive(candidate).await {
                let stored = self.resolved.get_or_init(|| candidate.clone());
                info!("Resolved Ollama endpoint: {}", stored);
                return stored.clone();
            }
        }

        let fallback = self.candidates.first().cloned().unwrap_or_default();
        warn!(
            "No Ollama endpoint answered ({} candidates), using {}",
            self.candidates.len(),
            fallback
        );
        fallback
    }
}

//! Configuration management for scrivener.
//!
//! Settings come from serde defaults, then an optional TOML file, then
//! environment variables (which always win).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "scrivener.db";

/// Config filename looked up inside the data directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "scrivener.toml";

/// OpenAI-compatible provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key (OPENAI_API_KEY).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// API base URL, without the `/v1` suffix.
    pub endpoint: String,
    /// Vision/chat model.
    pub model: String,
    /// Embedding model.
    pub embedding_model: String,
    /// Maximum tokens for OCR responses.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.openai.com".to_string(),
            model: "gpt-4o".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            max_tokens: 1024,
            timeout_secs: 120,
        }
    }
}

/// Gemini provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Local Ollama settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Preferred base URL. Tried first.
    pub endpoint: String,
    /// Extra base URLs tried after the well-known defaults.
    pub fallback_endpoints: Vec<String>,
    /// Model for generation and embeddings.
    pub model: String,
    /// Liveness check timeout in milliseconds.
    pub liveness_timeout_ms: u64,
    /// Generation timeout in seconds (slow local models).
    pub timeout_secs: u64,
    /// Model pull timeout in seconds.
    pub pull_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            fallback_endpoints: Vec::new(),
            model: "llama3".to_string(),
            liveness_timeout_ms: 1500,
            timeout_secs: 300,
            pull_timeout_secs: 1800,
        }
    }
}

/// Tesseract settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractConfig {
    /// Language for OCR (e.g., "eng", "deu+eng").
    pub language: String,
    /// Binary name or path.
    pub binary: String,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            binary: "tesseract".to_string(),
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database URL or path (overrides data_dir/scrivener.db if set).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Address the HTTP server binds to.
    pub bind: String,
    /// Provider family used when a request does not name one.
    pub default_provider: String,
    /// Number of results returned by similarity search.
    pub similarity_top_k: usize,
    pub openai: OpenAiConfig,
    pub gemini: GeminiConfig,
    pub ollama: OllamaConfig,
    pub tesseract: TesseractConfig,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scrivener");

        Self {
            data_dir,
            database_url: None,
            bind: "127.0.0.1:8000".to_string(),
            default_provider: "openai".to_string(),
            similarity_top_k: 10,
            openai: OpenAiConfig::default(),
            gemini: GeminiConfig::default(),
            ollama: OllamaConfig::default(),
            tesseract: TesseractConfig::default(),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.trim().parse().ok())
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load settings from a TOML file.
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config '{}': {}", path.display(), e)
        })?;
        Self::from_toml(&text)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `SCRIVENER_DATA_DIR`, `DATABASE_URL`, `SCRIVENER_BIND`
    /// - `LLM_PROVIDER`: default provider family ("openai", "gemini", "ollama")
    /// - `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_MODEL`, `OPENAI_EMBEDDING_MODEL`
    /// - `GEMINI_API_KEY`, `GEMINI_MODEL`
    /// - `OLLAMA_URL`, `OLLAMA_MODEL`, `OLLAMA_LIVENESS_TIMEOUT_MS`
    /// - `TESSERACT_LANG`, `TESSERACT_BIN`
    /// - `SIMILARITY_TOP_K`
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(val) = env_var("SCRIVENER_DATA_DIR") {
            self.data_dir = PathBuf::from(val);
        }
        if let Some(val) = env_var("DATABASE_URL") {
            self.database_url = Some(val);
        }
        if let Some(val) = env_var("SCRIVENER_BIND") {
            self.bind = val;
        }
        if let Some(val) = env_var("LLM_PROVIDER") {
            self.default_provider = val.to_lowercase();
        }
        if let Some(n) = env_parse("SIMILARITY_TOP_K") {
            self.similarity_top_k = n;
        }

        if let Some(val) = env_var("OPENAI_API_KEY") {
            self.openai.api_key = Some(val);
        }
        if let Some(val) = env_var("OPENAI_BASE_URL") {
            self.openai.endpoint = val.trim_end_matches('/').trim_end_matches("/v1").to_string();
        }
        if let Some(val) = env_var("OPENAI_MODEL") {
            self.openai.model = val;
        }
        if let Some(val) = env_var("OPENAI_EMBEDDING_MODEL") {
            self.openai.embedding_model = val;
        }

        if let Some(val) = env_var("GEMINI_API_KEY") {
            self.gemini.api_key = Some(val);
        }
        if let Some(val) = env_var("GEMINI_MODEL") {
            self.gemini.model = val;
        }

        if let Some(val) = env_var("OLLAMA_URL") {
            self.ollama.endpoint = val.trim_end_matches('/').to_string();
        }
        if let Some(val) = env_var("OLLAMA_MODEL") {
            self.ollama.model = val;
        }
        if let Some(ms) = env_parse("OLLAMA_LIVENESS_TIMEOUT_MS") {
            self.ollama.liveness_timeout_ms = ms;
        }

        if let Some(val) = env_var("TESSERACT_LANG") {
            self.tesseract.language = val;
        }
        if let Some(val) = env_var("TESSERACT_BIN") {
            self.tesseract.binary = val;
        }
        self
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        match self.database_url {
            Some(ref url) => url.clone(),
            None => self.database_path().display().to_string(),
        }
    }

    /// Full path to the default SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DEFAULT_DATABASE_FILENAME)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory (--data flag).
    pub data: Option<PathBuf>,
}

/// Load settings: explicit config file, else `<data_dir>/scrivener.toml`,
/// else defaults; then env overrides; then command-line overrides.
pub fn load_settings(options: &LoadOptions) -> anyhow::Result<Settings> {
    let mut settings = match options.config_path {
        Some(ref path) => Settings::load_from_path(path)?,
        None => {
            let data_dir = options
                .data
                .clone()
                .or_else(|| env_var("SCRIVENER_DATA_DIR").map(PathBuf::from))
                .unwrap_or_else(|| Settings::default().data_dir);
            let candidate = data_dir.join(DEFAULT_CONFIG_FILENAME);
            if candidate.exists() {
                tracing::debug!("Using config file: {}", candidate.display());
                Settings::load_from_path(&candidate)?
            } else {
                Settings::default()
            }
        }
    }
    .with_env_overrides();

    if let Some(ref data) = options.data {
        settings.data_dir = data.clone();
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.default_provider, "openai");
        assert_eq!(settings.similarity_top_k, 10);
        assert_eq!(settings.openai.model, "gpt-4o");
        assert_eq!(settings.openai.embedding_model, "text-embedding-3-small");
        assert_eq!(settings.gemini.model, "gemini-2.0-flash");
        assert_eq!(settings.ollama.endpoint, "http://localhost:11434");
        assert_eq!(settings.ollama.model, "llama3");
        assert_eq!(settings.tesseract.language, "eng");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            default_provider = "ollama"
            similarity_top_k = 5

            [ollama]
            endpoint = "http://gpu-box:11434"
            fallback_endpoints = ["http://backup:11434"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.default_provider, "ollama");
        assert_eq!(settings.similarity_top_k, 5);
        assert_eq!(settings.ollama.endpoint, "http://gpu-box:11434");
        assert_eq!(settings.ollama.fallback_endpoints, vec!["http://backup:11434"]);
        assert_eq!(settings.ollama.model, "llama3");
        assert_eq!(settings.openai, OpenAiConfig::default());
    }

    #[test]
    fn test_database_url_defaults_to_data_dir() {
        let settings = Settings {
            data_dir: PathBuf::from("/tmp/scrivener-test"),
            ..Default::default()
        };
        assert_eq!(settings.database_url(), "/tmp/scrivener-test/scrivener.db");

        let settings = Settings {
            database_url: Some("sqlite:/var/db/notes.db".to_string()),
            ..settings
        };
        assert_eq!(settings.database_url(), "sqlite:/var/db/notes.db");
    }

    #[test]
    fn test_load_settings_reads_config_next_to_data() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILENAME),
            "bind = \"0.0.0.0:9000\"\n",
        )
        .unwrap();

        let settings = load_settings(&LoadOptions {
            config_path: None,
            data: Some(dir.path().to_path_buf()),
        })
        .unwrap();
        assert_eq!(settings.data_dir, dir.path());
        // SCRIVENER_BIND may be set in the environment running the tests.
        if std::env::var("SCRIVENER_BIND").is_err() {
            assert_eq!(settings.bind, "0.0.0.0:9000");
        }
    }
}

//! Tesseract OCR provider.
//!
//! Runs the `tesseract` command-line tool on a temporary PNG file. This is
//! the terminal step of every escalation plan: its output is accepted as-is.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::TesseractConfig;
use crate::ocr::backend::{OcrError, OcrProvider, PromptStyle, ProviderKind};
use crate::ocr::image::PngImage;

/// Tesseract provider.
pub struct TesseractProvider {
    config: TesseractConfig,
}

impl TesseractProvider {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    /// Whether the tesseract binary can be found.
    pub fn is_available(&self) -> bool {
        which::which(&self.config.binary).is_ok()
    }

    fn run_tesseract(config: &TesseractConfig, image_path: &Path) -> Result<String, OcrError> {
        let output = Command::new(&config.binary)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &config.language])
            .output();

        match output {
            Ok(output) if output.status.success() => Ok(stdout_text(&output.stdout)),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::BackendNotAvailable(
                format!("{} not found (install tesseract-ocr)", config.binary),
            )),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

/// Tesseract's stdout as produced, layout whitespace included.
fn stdout_text(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout).into_owned()
}

impl Default for TesseractProvider {
    fn default() -> Self {
        Self::new(TesseractConfig::default())
    }
}

#[async_trait]
impl OcrProvider for TesseractProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Tesseract
    }

    fn is_terminal(&self) -> bool {
        true
    }

    async fn extract_text(
        &self,
        image: &PngImage,
        _prompt: PromptStyle,
        _model: Option<&str>,
    ) -> Result<String, OcrError> {
        let mut file = tempfile::Builder::new()
            .prefix("scrivener-")
            .suffix(".png")
            .tempfile()?;
        file.write_all(image.as_bytes())?;
        file.flush()?;

        let config = self.config.clone();
        debug!("Tesseract OCR: lang={}, image={} bytes", config.language, image.len());
        let text = tokio::task::spawn_blocking(move || {
            let file: NamedTempFile = file;
            Self::run_tesseract(&config, file.path())
        })
        .await
        .map_err(|e| OcrError::OcrFailed(format!("tesseract task failed: {}", e)))??;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        let provider = TesseractProvider::default();
        assert!(provider.is_terminal());
        assert_eq!(provider.provenance(None), "tesseract");
    }

    #[test]
    fn test_stdout_is_kept_verbatim() {
        assert_eq!(stdout_text(b"  Dear Sir,\n\n\x0c"), "  Dear Sir,\n\n\x0c");
        assert_eq!(stdout_text(b"\n"), "\n");
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_available() {
        let provider = TesseractProvider::new(TesseractConfig {
            binary: "scrivener-no-such-tesseract".to_string(),
            ..TesseractConfig::default()
        });
        assert!(!provider.is_available());

        let png = PngImage::from_dynamic(&image::DynamicImage::new_luma8(4, 4)).unwrap();
        let err = provider
            .extract_text(&png, PromptStyle::Standard, None)
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::BackendNotAvailable(_)));
    }
}

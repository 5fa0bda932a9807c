//! OCR command.

use std::path::Path;

use console::style;

use super::super::helpers::resolve_project;
use crate::config::Settings;
use crate::models::ExtractionRequest;
use crate::services::Services;

/// Extract text from an image file, optionally saving it.
pub async fn cmd_ocr(
    settings: &Settings,
    image: &Path,
    provider: Option<String>,
    model: Option<String>,
    project: Option<&str>,
    save: bool,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(image)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read '{}': {}", image.display(), e))?;

    if !infer::is_image(&bytes) {
        anyhow::bail!("'{}' does not look like an image", image.display());
    }

    let services = Services::from_settings(settings).await?;
    let project_id = resolve_project(&services, project).await?;

    let mut request = ExtractionRequest::new(bytes);
    if let Some(name) = image.file_name() {
        request = request.with_filename(name.to_string_lossy());
    }
    if let Some(provider) = provider {
        request = request.with_provider(provider);
    }
    if let Some(model) = model {
        request = request.with_model(model);
    }
    if let Some(id) = project_id {
        request = request.with_project(id);
    }

    let processed = services.ocr.process(request, save).await?;

    println!("{}", processed.text);
    eprintln!();
    match processed.id {
        Some(id) => eprintln!(
            "{} Saved as #{} via {}{}",
            style("✓").green(),
            id,
            style(&processed.provider).cyan(),
            if processed.embedded { "" } else { " (no embedding)" }
        ),
        None => eprintln!("{} Extracted via {}", style("✓").green(), style(&processed.provider).cyan()),
    }

    Ok(())
}

//! Stored text commands: listing, search, similarity and summaries.

use console::style;

use super::super::helpers::{preview, resolve_project};
use crate::config::Settings;
use crate::models::StoredText;
use crate::services::{Services, SummarizeRequest};

fn print_texts(texts: &[StoredText]) {
    println!("{:<6} {:<20} {:<24} {:<18} Text", "ID", "Created", "Filename", "Provider");
    println!("{}", "-".repeat(100));
    for text in texts {
        println!(
            "{:<6} {:<20} {:<24} {:<18} {}",
            text.id,
            text.created_at.format("%Y-%m-%d %H:%M"),
            preview(text.filename.as_deref().unwrap_or("-"), 23),
            preview(&text.provider, 17),
            preview(&text.text, 40)
        );
    }
}

/// List stored texts.
pub async fn cmd_list(settings: &Settings, project: Option<&str>) -> anyhow::Result<()> {
    let services = Services::from_settings(settings).await?;
    let project_id = resolve_project(&services, project).await?;
    let texts = services.ocr.list(project_id).await?;

    if texts.is_empty() {
        println!("{} No texts stored yet. Run 'scrivener ocr <image>'.", style("!").yellow());
        return Ok(());
    }

    print_texts(&texts);
    Ok(())
}

/// Substring search.
pub async fn cmd_search(settings: &Settings, query: &str, project: Option<&str>) -> anyhow::Result<()> {
    let services = Services::from_settings(settings).await?;
    let project_id = resolve_project(&services, project).await?;
    let texts = services.ocr.search(query, project_id).await?;

    if texts.is_empty() {
        println!("{} No texts match '{}'", style("!").yellow(), query);
        return Ok(());
    }

    println!("{} {} match(es)\n", style("✓").green(), texts.len());
    print_texts(&texts);
    Ok(())
}

/// Similarity search.
pub async fn cmd_similar(
    settings: &Settings,
    query: &str,
    project: Option<&str>,
    provider: Option<&str>,
) -> anyhow::Result<()> {
    let services = Services::from_settings(settings).await?;
    let project_id = resolve_project(&services, project).await?;
    let results = services.ocr.similarity_search(query, project_id, provider).await?;

    if results.is_empty() {
        println!("{} No embedded texts to compare against", style("!").yellow());
        return Ok(());
    }

    println!("{:<6} {:<8} {:<24} Text", "ID", "Score", "Filename");
    println!("{}", "-".repeat(90));
    for result in results {
        println!(
            "{:<6} {:<8.4} {:<24} {}",
            result.text.id,
            result.score,
            preview(result.text.filename.as_deref().unwrap_or("-"), 23),
            preview(&result.text.text, 50)
        );
    }
    Ok(())
}

/// Summarize text.
pub async fn cmd_summarize(
    settings: &Settings,
    mut request: SummarizeRequest,
    project: Option<&str>,
) -> anyhow::Result<()> {
    let services = Services::from_settings(settings).await?;
    request.project_id = resolve_project(&services, project).await?;

    let summary = services.summarize.summarize(&request).await?;
    println!("{}", summary.summary);
    eprintln!();
    eprintln!("{} Summarized via {}", style("✓").green(), style(&summary.provider).cyan());
    Ok(())
}

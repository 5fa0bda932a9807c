//! Project management commands.

use console::style;

use super::super::helpers::truncate;
use crate::config::Settings;
use crate::services::{ServiceError, Services};

/// Create a project.
pub async fn cmd_project_create(
    settings: &Settings,
    name: &str,
    description: Option<&str>,
) -> anyhow::Result<()> {
    let services = Services::from_settings(settings).await?;
    match services.projects.create(name, description).await {
        Ok(project) => {
            println!(
                "{} Created project '{}' (#{})",
                style("✓").green(),
                project.name,
                project.id
            );
            Ok(())
        }
        Err(ServiceError::InvalidInput(msg)) => {
            println!("{} {}", style("✗").red(), msg);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// List projects with their text counts.
pub async fn cmd_project_list(settings: &Settings) -> anyhow::Result<()> {
    let services = Services::from_settings(settings).await?;
    let projects = services.projects.list().await?;

    if projects.is_empty() {
        println!(
            "{} No projects yet. Run 'scrivener project create <name>'.",
            style("!").yellow()
        );
        return Ok(());
    }

    let counts = services.analytics.project_counts().await?;

    println!("\n{}", style("Projects").bold());
    println!("{}", "-".repeat(70));
    println!("{:<6} {:<25} {:<8} Description", "ID", "Name", "Texts");
    println!("{}", "-".repeat(70));
    for project in projects {
        let count = counts
            .iter()
            .find(|c| c.id == project.id)
            .map(|c| c.count)
            .unwrap_or(0);
        println!(
            "{:<6} {:<25} {:<8} {}",
            project.id,
            truncate(&project.name, 24),
            count,
            truncate(project.description.as_deref().unwrap_or(""), 30)
        );
    }
    Ok(())
}

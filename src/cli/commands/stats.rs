//! Collection statistics command.

use console::style;

use super::super::helpers::{resolve_project, truncate};
use crate::config::Settings;
use crate::services::analytics::Interval;
use crate::services::Services;

/// Show statistics for the whole collection or one project.
pub async fn cmd_stats(settings: &Settings, project: Option<&str>) -> anyhow::Result<()> {
    let services = Services::from_settings(settings).await?;
    let project_id = resolve_project(&services, project).await?;
    let stats = services.analytics.stats(project_id).await?;

    println!("\n{}", style("Collection").bold());
    println!("{}", "-".repeat(40));
    println!("{:<20} {}", "Texts:", stats.count);
    if let Some(avg) = stats.avg_text_length {
        println!("{:<20} {:.1} chars", "Average length:", avg);
    }
    if let (Some(earliest), Some(latest)) = (stats.earliest, stats.latest) {
        println!("{:<20} {}", "Earliest:", earliest.format("%Y-%m-%d %H:%M"));
        println!("{:<20} {}", "Latest:", latest.format("%Y-%m-%d %H:%M"));
    }

    if stats.count == 0 {
        return Ok(());
    }

    let activity = services.analytics.activity(project_id, Interval::Day, 7).await?;
    println!("\n{}", style("Recent activity (per day)").bold());
    for point in activity.series {
        println!("  {}  {}", point.bucket.format("%Y-%m-%d"), point.count);
    }

    let top = services.analytics.top_filenames(project_id, 5).await?;
    println!("\n{}", style("Top filenames").bold());
    for entry in top {
        println!("  {:<30} {}", truncate(&entry.name, 29), entry.count);
    }

    Ok(())
}

//! Initialize command.

use console::style;

use crate::config::Settings;
use crate::repository::DbContext;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = DbContext::from_url(&settings.database_url());
    ctx.init_schema().await?;

    println!(
        "{} Initialized Scrivener in {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    println!("  Database: {}", settings.database_url());

    Ok(())
}

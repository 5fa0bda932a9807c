//! Local model listing command.

use console::style;

use crate::config::Settings;
use crate::services::Services;

/// List installed (or running) Ollama models.
pub async fn cmd_models(settings: &Settings, running: bool) -> anyhow::Result<()> {
    let services = Services::from_settings(settings).await?;
    let models = if running {
        services.models.running().await?
    } else {
        services.models.installed().await?
    };

    if models.is_empty() {
        let what = if running { "running" } else { "installed" };
        println!("{} No {} models", style("!").yellow(), what);
        return Ok(());
    }

    for model in models {
        println!("  {}", model);
    }
    Ok(())
}

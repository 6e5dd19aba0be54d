//! Application settings commands

use arkive_core::LogPruner;
use arkive_domain::{ApplicationSettings, Result as DomainResult};
use tracing::{debug, warn};

use crate::utils::command_helpers::execute_command;
use crate::AppContext;

pub async fn get_settings(ctx: &AppContext) -> Result<ApplicationSettings, String> {
    execute_command("settings::get_settings", || ctx.settings.load()).await
}

/// Save every setting, then apply the retention window right away.
pub async fn save_settings(ctx: &AppContext, settings: ApplicationSettings) -> Result<(), String> {
    execute_command("settings::save_settings", || save_and_prune(ctx, settings)).await
}

async fn save_and_prune(ctx: &AppContext, settings: ApplicationSettings) -> DomainResult<()> {
    ctx.settings.save(&settings).await?;

    match ctx.retention.prune().await {
        Ok(removed) => debug!(removed, "settings.retention_applied"),
        Err(err) => warn!(error = %err, "settings.retention_failed"),
    }
    Ok(())
}

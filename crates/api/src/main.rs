//! Arkive - backup and sync job scheduler
//!
//! Loads configuration, wires the application context and keeps the trigger
//! engine running until Ctrl-C.

use std::sync::Arc;

use anyhow::Context as _;
use arkive_core::LogPruner;
use arkive_lib::utils::logging::init_logging;
use arkive_lib::AppContext;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env before reading configuration
    let dotenv = dotenvy::dotenv();

    let config = arkive_infra::config::load().context("failed to load configuration")?;
    let mut logging = init_logging(&config.logging).context("failed to initialise logging")?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "env.loaded"),
        Err(err) => warn!(error = %err, "env.not_loaded"),
    }

    info!(db_path = %config.database.path, "arkive.starting");
    let ctx = Arc::new(
        AppContext::new_with_config(config).await.context("failed to initialise application")?,
    );

    let _log_writer = logging.persist_to(
        Arc::clone(&ctx.application_logs),
        Arc::clone(&ctx.retention) as Arc<dyn LogPruner>,
    );

    let health = ctx.health_check().await;
    info!(healthy = health.is_healthy, score = health.score, "arkive.started");

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("arkive.shutdown_requested");

    ctx.shutdown().await.context("failed to shut down cleanly")?;
    info!("arkive.stopped");
    Ok(())
}

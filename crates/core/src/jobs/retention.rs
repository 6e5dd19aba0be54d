//! Log retention for execution and application logs

use std::sync::Arc;

use arkive_domain::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use super::ports::{ApplicationLogRepository, ExecutionRepository, LogPruner};
use crate::settings::ApplicationSettingsService;

/// Deletes log rows older than the configured retention window. A retention
/// value of zero disables pruning.
#[derive(Clone)]
pub struct LogRetentionService {
    settings: ApplicationSettingsService,
    executions: Arc<dyn ExecutionRepository>,
    application_logs: Option<Arc<dyn ApplicationLogRepository>>,
}

impl LogRetentionService {
    pub fn new(settings: ApplicationSettingsService, executions: Arc<dyn ExecutionRepository>) -> Self {
        Self { settings, executions, application_logs: None }
    }

    /// Apply the same window to persisted application logs.
    #[must_use]
    pub fn with_application_logs(mut self, application_logs: Arc<dyn ApplicationLogRepository>) -> Self {
        self.application_logs = Some(application_logs);
        self
    }

    #[instrument(skip(self))]
    pub async fn prune_at(&self, now: DateTime<Utc>) -> Result<u64> {
        let settings = self.settings.load().await?;
        if settings.log_retention_value == 0 {
            debug!("retention.disabled");
            return Ok(0);
        }

        let Some(cutoff) =
            settings.log_retention_unit.cutoff_before(now, settings.log_retention_value)
        else {
            return Ok(0);
        };

        let mut removed = self.executions.delete_logs_before(cutoff).await?;
        if let Some(application_logs) = &self.application_logs {
            removed += application_logs.delete_application_logs_before(cutoff).await?;
        }
        if removed > 0 {
            info!(removed, cutoff = %cutoff, "retention.pruned");
        }
        Ok(removed)
    }
}

#[async_trait]
impl LogPruner for LogRetentionService {
    async fn prune(&self) -> Result<u64> {
        self.prune_at(Utc::now()).await
    }
}

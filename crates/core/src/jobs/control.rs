//! Global pause/resume of the scheduler
//!
//! The whole-scheduler switch is a single persisted boolean. Every store and
//! scheduler call goes through [`StoreLockRetry`] so a briefly locked
//! database does not fail a toggle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arkive_common::resilience::{
    BackoffStrategy, RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryPolicy,
};
use arkive_domain::constants::{
    SCHEDULE_ENABLED_KEY, STORE_LOCK_MAX_ATTEMPTS, STORE_LOCK_RETRY_STEP_MS,
};
use arkive_domain::{ArkiveError, Result};
use tracing::{debug, info, instrument};

use super::ports::SchedulerControl;
use crate::settings::{service::parse_bool, SettingsRepository};

/// Retries only [`ArkiveError::StoreLocked`].
#[derive(Debug, Clone, Copy, Default)]
struct StoreLockPolicy;

impl RetryPolicy<ArkiveError> for StoreLockPolicy {
    fn should_retry(&self, error: &ArkiveError, _attempt: u32) -> RetryDecision {
        if error.is_store_locked() {
            RetryDecision::Retry
        } else {
            RetryDecision::Stop
        }
    }
}

/// Bounded retry for store-locked failures with a linearly growing delay:
/// `step`, `2 * step`, `3 * step`, ...
#[derive(Debug, Clone)]
pub struct StoreLockRetry {
    executor: RetryExecutor<StoreLockPolicy>,
}

impl StoreLockRetry {
    pub fn new(max_attempts: u32, step: Duration) -> Self {
        let config = RetryConfig {
            max_attempts: max_attempts.max(1),
            backoff: BackoffStrategy::Linear { initial_delay: step, increment: step },
            max_total_time: None,
        };
        Self { executor: RetryExecutor::new(config, StoreLockPolicy) }
    }

    pub fn max_attempts(&self) -> u32 {
        self.executor.config().max_attempts
    }

    /// Run `operation`, retrying while it fails with a store-locked error.
    /// The last error is returned unchanged.
    pub async fn run<F, Fut, T>(&self, operation_name: &'static str, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        debug!(operation = operation_name, "store_lock_retry.run");
        self.executor.execute(operation).await.map_err(RetryError::into_source)
    }
}

impl Default for StoreLockRetry {
    fn default() -> Self {
        Self::new(STORE_LOCK_MAX_ATTEMPTS, Duration::from_millis(STORE_LOCK_RETRY_STEP_MS))
    }
}

/// Owns the persisted `ArchiveScheduleEnabled` flag and applies it to the
/// scheduler.
pub struct ScheduleControlService {
    settings: Arc<dyn SettingsRepository>,
    scheduler: Arc<dyn SchedulerControl>,
    default_enabled: bool,
    retry: StoreLockRetry,
}

impl ScheduleControlService {
    pub fn new(
        settings: Arc<dyn SettingsRepository>,
        scheduler: Arc<dyn SchedulerControl>,
        default_enabled: bool,
    ) -> Self {
        Self::with_retry(settings, scheduler, default_enabled, StoreLockRetry::default())
    }

    pub fn with_retry(
        settings: Arc<dyn SettingsRepository>,
        scheduler: Arc<dyn SchedulerControl>,
        default_enabled: bool,
        retry: StoreLockRetry,
    ) -> Self {
        Self { settings, scheduler, default_enabled, retry }
    }

    /// Stored flag, or the configured default when absent or unparseable.
    pub async fn get_schedule_enabled(&self) -> Result<bool> {
        Ok(self.read_flag().await?.unwrap_or(self.default_enabled))
    }

    /// Persist the effective flag if absent, then apply it.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<bool> {
        let enabled = match self.read_flag().await? {
            Some(enabled) => enabled,
            None => {
                self.write_flag(self.default_enabled).await?;
                self.default_enabled
            }
        };

        self.apply(enabled).await?;
        info!(enabled, "schedule_control.initialized");
        Ok(enabled)
    }

    #[instrument(skip(self))]
    pub async fn set_schedule_enabled(&self, enabled: bool) -> Result<()> {
        self.write_flag(enabled).await?;
        self.apply(enabled).await?;
        info!(enabled, "schedule_control.toggled");
        Ok(())
    }

    async fn read_flag(&self) -> Result<Option<bool>> {
        let settings = Arc::clone(&self.settings);
        let stored = self
            .retry
            .run("get_schedule_flag", || {
                let settings = Arc::clone(&settings);
                async move { settings.get_setting(SCHEDULE_ENABLED_KEY).await }
            })
            .await?;
        Ok(stored.as_deref().and_then(parse_bool))
    }

    async fn write_flag(&self, enabled: bool) -> Result<()> {
        let settings = Arc::clone(&self.settings);
        let value = enabled.to_string();
        self.retry
            .run("set_schedule_flag", || {
                let settings = Arc::clone(&settings);
                let value = value.clone();
                async move { settings.set_setting(SCHEDULE_ENABLED_KEY, &value).await }
            })
            .await
    }

    async fn apply(&self, enabled: bool) -> Result<()> {
        let scheduler = Arc::clone(&self.scheduler);

        let started = self
            .retry
            .run("scheduler_is_started", || {
                let scheduler = Arc::clone(&scheduler);
                async move { scheduler.is_started().await }
            })
            .await?;

        if !started {
            self.retry
                .run("scheduler_start", || {
                    let scheduler = Arc::clone(&scheduler);
                    async move { scheduler.start().await }
                })
                .await?;
        }

        if enabled {
            self.retry
                .run("scheduler_resume_all", || {
                    let scheduler = Arc::clone(&scheduler);
                    async move { scheduler.resume_all().await }
                })
                .await
        } else {
            self.retry
                .run("scheduler_pause_all", || {
                    let scheduler = Arc::clone(&scheduler);
                    async move { scheduler.pause_all().await }
                })
                .await
        }
    }
}

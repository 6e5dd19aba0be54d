//! Execution orchestrator
//!
//! Runs one job end to end: guard, load, notify, record, sync, persist,
//! summarize, notify, prune. Exactly one execution record is written for
//! every run that gets past the job lookup, and it never stays Running: if
//! the terminal write keeps failing, a bare Failed state is stored instead.

use std::collections::HashSet;
use std::sync::Arc;

use arkive_domain::{
    ApplicationSettings, ArkiveError, Execution, ExecutionLog, ExecutionStatus, Job, LogLevel,
    NotificationEvent, Result, SyncCounters,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::control::StoreLockRetry;
use super::ports::{ExecutionRepository, JobRepository, JobRunner, LogPruner};
use super::summary::build_detail_summary;
use crate::notifications::NotificationBus;
use crate::settings::ApplicationSettingsService;
use crate::sync::{SyncEngine, SyncLogEntry, SyncResult};

/// Marks a job as running for the lifetime of the guard.
struct RunGuard {
    running: Arc<Mutex<HashSet<Uuid>>>,
    job_id: Uuid,
}

impl RunGuard {
    /// `None` when the job is already marked as running.
    fn acquire(running: &Arc<Mutex<HashSet<Uuid>>>, job_id: Uuid) -> Option<Self> {
        running.lock().insert(job_id).then(|| Self { running: Arc::clone(running), job_id })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.lock().remove(&self.job_id);
    }
}

/// Outcome of the sync step, before persistence.
struct RunOutcome {
    status: ExecutionStatus,
    counters: SyncCounters,
    logs: Vec<ExecutionLog>,
}

#[derive(Clone)]
pub struct JobExecutionService {
    jobs: Arc<dyn JobRepository>,
    executions: Arc<dyn ExecutionRepository>,
    settings: ApplicationSettingsService,
    engine: Arc<dyn SyncEngine>,
    bus: NotificationBus,
    pruner: Arc<dyn LogPruner>,
    store_retry: StoreLockRetry,
    running: Arc<Mutex<HashSet<Uuid>>>,
}

impl JobExecutionService {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        executions: Arc<dyn ExecutionRepository>,
        settings: ApplicationSettingsService,
        engine: Arc<dyn SyncEngine>,
        bus: NotificationBus,
        pruner: Arc<dyn LogPruner>,
    ) -> Self {
        Self {
            jobs,
            executions,
            settings,
            engine,
            bus,
            pruner,
            store_retry: StoreLockRetry::default(),
            running: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Replace the retry applied to terminal execution writes.
    #[must_use]
    pub fn with_store_retry(mut self, store_retry: StoreLockRetry) -> Self {
        self.store_retry = store_retry;
        self
    }

    pub fn is_running(&self, job_id: Uuid) -> bool {
        self.running.lock().contains(&job_id)
    }

    /// Run `job_id` once.
    ///
    /// Returns `NotFound` when no job row exists and `AlreadyRunning` when
    /// another run of the same job is in progress; neither writes a record.
    /// Engine failures are recorded, not returned. A terminal write that
    /// cannot be stored even in its bare Failed form is returned after the
    /// Failed notification went out.
    #[instrument(skip(self, cancel), fields(job_id = %job_id))]
    pub async fn execute(&self, job_id: Uuid, cancel: CancellationToken) -> Result<Execution> {
        let Some(_guard) = RunGuard::acquire(&self.running, job_id) else {
            warn!("execution.rejected_already_running");
            return Err(ArkiveError::AlreadyRunning(format!("job {job_id}")));
        };

        let job = self
            .jobs
            .get_job(job_id)
            .await?
            .ok_or_else(|| ArkiveError::NotFound(format!("job {job_id}")))?;

        if job.is_deleted() {
            return self.record_deleted(&job).await;
        }

        self.publish(NotificationEvent::started(&job));

        let mut execution = Execution::start(job.id);
        self.executions.insert_execution(&execution).await?;
        info!(execution_id = %execution.id, "execution.started");

        let settings = self.load_settings().await;
        let outcome = match self.engine.execute(&job, cancel).await {
            Ok(result) => completed(&execution, &result, settings.enable_verbose_logging),
            Err(err) if err.is_cancelled() => cancelled(&execution),
            Err(err) => failed(&execution, &err),
        };

        execution.finish(outcome.status, outcome.counters);
        let persisted = self.persist_terminal(&mut execution, &outcome.logs).await;
        info!(
            execution_id = %execution.id,
            status = %execution.status,
            duration_ms = execution.duration_ms,
            files_copied = execution.counters.files_copied,
            files_updated = execution.counters.files_updated,
            files_failed = execution.counters.files_failed,
            "execution.finished"
        );

        if let Err(err) = self.jobs.mark_last_run(job.id, execution.started_at).await {
            warn!(error = %err, "execution.mark_last_run_failed");
        }

        let summary = self.detail_summary(execution.id).await;
        self.publish(NotificationEvent::finished(&job, execution.status, execution.counters, summary));

        match self.pruner.prune().await {
            Ok(removed) => debug!(removed, "execution.retention_pruned"),
            Err(err) => warn!(error = %err, "execution.retention_failed"),
        }

        persisted.map(|()| execution)
    }

    /// A deleted job still gets a Failed record so the attempt is auditable.
    async fn record_deleted(&self, job: &Job) -> Result<Execution> {
        warn!("execution.job_deleted");
        let mut execution = Execution::start(job.id);
        self.executions.insert_execution(&execution).await?;

        let log = ExecutionLog::new(
            execution.id,
            LogLevel::Error,
            format!("Job '{}' has been deleted", job.name),
        );
        let counters = SyncCounters { error_count: 1, ..SyncCounters::default() };
        execution.finish(ExecutionStatus::Failed, counters);
        let persisted = self.persist_terminal(&mut execution, &[log]).await;

        let summary = self.detail_summary(execution.id).await;
        self.publish(NotificationEvent::finished(job, execution.status, execution.counters, summary));
        persisted.map(|()| execution)
    }

    /// Store the terminal state with its log rows, retrying store locks.
    ///
    /// When that still fails the run is downgraded to Failed and only the
    /// execution row is written, so the record does not stay Running.
    async fn persist_terminal(&self, execution: &mut Execution, logs: &[ExecutionLog]) -> Result<()> {
        let complete = {
            let terminal = &*execution;
            self.store_retry
                .run("complete_execution", || self.executions.complete_execution(terminal, logs))
                .await
        };
        let Err(err) = complete else {
            return Ok(());
        };

        error!(execution_id = %execution.id, error = %err, "execution.persist_failed");
        let counters = SyncCounters {
            error_count: execution.counters.error_count.saturating_add(1),
            ..execution.counters
        };
        execution.finish(ExecutionStatus::Failed, counters);

        let bare = &*execution;
        match self.store_retry.run("finish_execution", || self.executions.insert_execution(bare)).await {
            Ok(()) => {
                warn!(execution_id = %execution.id, "execution.persisted_without_logs");
                Ok(())
            }
            Err(fallback) => {
                error!(execution_id = %execution.id, error = %fallback, "execution.persist_fallback_failed");
                Err(err)
            }
        }
    }

    async fn load_settings(&self) -> ApplicationSettings {
        self.settings.load().await.unwrap_or_else(|err| {
            warn!(error = %err, "execution.settings_unavailable");
            ApplicationSettings::default()
        })
    }

    /// Re-read from the store so the summary reflects what was persisted.
    async fn detail_summary(&self, execution_id: Uuid) -> Option<String> {
        match self.executions.list_issue_logs(execution_id).await {
            Ok(logs) => build_detail_summary(&logs),
            Err(err) => {
                warn!(error = %err, "execution.summary_unavailable");
                None
            }
        }
    }

    fn publish(&self, event: NotificationEvent) {
        let receivers = self.bus.publish(event);
        debug!(receivers, "execution.notification_published");
    }
}

#[async_trait]
impl JobRunner for JobExecutionService {
    async fn run_job(&self, job_id: Uuid, cancel: CancellationToken) -> Result<Execution> {
        self.execute(job_id, cancel).await
    }
}

fn completed(execution: &Execution, result: &SyncResult, verbose: bool) -> RunOutcome {
    let status = if result.counters.is_clean() {
        ExecutionStatus::Completed
    } else {
        ExecutionStatus::CompletedWithWarnings
    };
    let logs =
        result.persistable_entries(verbose).map(|entry| to_log(execution.id, entry)).collect();
    RunOutcome { status, counters: result.counters, logs }
}

fn cancelled(execution: &Execution) -> RunOutcome {
    info!(execution_id = %execution.id, "execution.cancelled");
    let log = ExecutionLog::new(execution.id, LogLevel::Warning, "Execution was cancelled");
    RunOutcome {
        status: ExecutionStatus::Cancelled,
        counters: SyncCounters { warning_count: 1, ..SyncCounters::default() },
        logs: vec![log],
    }
}

fn failed(execution: &Execution, err: &ArkiveError) -> RunOutcome {
    error!(execution_id = %execution.id, error = %err, kind = err.label(), "execution.failed");
    let mut log = ExecutionLog::new(execution.id, LogLevel::Error, err.to_string());
    log.exception = Some(format!("{err:?}"));
    RunOutcome {
        status: ExecutionStatus::Failed,
        counters: SyncCounters { error_count: 1, ..SyncCounters::default() },
        logs: vec![log],
    }
}

fn to_log(execution_id: Uuid, entry: &SyncLogEntry) -> ExecutionLog {
    let mut log = ExecutionLog::new(execution_id, entry.level, entry.message.clone());
    log.file_path = entry.file_path.clone();
    log.operation = entry.operation;
    log.exception = entry.exception.clone();
    log
}

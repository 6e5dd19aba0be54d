//! Polling trigger engine
//!
//! A single background loop polls the persistent trigger store and hands due
//! triggers to worker tasks. Workers are bounded by a semaphore sized from
//! `max_concurrency`; a job whose trigger-fired run is still executing is
//! not fired again until that run finishes.
//!
//! Lifecycle follows the other background loops in this crate: explicit
//! `start`/`shutdown`, a cancellation token per loop generation and a join
//! handle awaited with a timeout.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arkive_core::schedule::{next_fire_after, parse_cron};
use arkive_core::JobRunner;
use arkive_domain::{Result, SchedulerConfig, Trigger, TriggerSchedule};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::{DashMap, DashSet};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::database::SqliteTriggerRepository;
use crate::scheduling::error::{SchedulerError, SchedulerResult};

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the trigger engine
#[derive(Debug, Clone)]
pub struct TriggerEngineConfig {
    pub poll_interval: Duration,
    pub max_concurrency: usize,
    /// Recurring triggers later than this are skipped and rescheduled.
    pub misfire_threshold: Duration,
    /// Bound on waiting for the loop and workers during shutdown.
    pub join_timeout: Duration,
}

impl From<&SchedulerConfig> for TriggerEngineConfig {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            max_concurrency: config.max_concurrency.max(1),
            misfire_threshold: Duration::from_secs(config.misfire_threshold_secs),
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for TriggerEngineConfig {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}

/// Cancellation tokens of executing runs, grouped by job.
#[derive(Default)]
struct RunRegistry {
    runs: DashMap<Uuid, Vec<(u64, CancellationToken)>>,
    /// Jobs with a trigger-fired run in progress.
    triggered: DashSet<Uuid>,
    next_id: AtomicU64,
}

impl RunRegistry {
    fn register(self: &Arc<Self>, job_id: Uuid, token: CancellationToken, triggered: bool) -> RunRegistration {
        let run_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.runs.entry(job_id).or_default().push((run_id, token));
        if triggered {
            self.triggered.insert(job_id);
        }
        RunRegistration { registry: Arc::clone(self), job_id, run_id, triggered }
    }

    fn cancel_job(&self, job_id: Uuid) -> bool {
        self.runs.get(&job_id).is_some_and(|runs| {
            runs.iter().for_each(|(_, token)| token.cancel());
            !runs.is_empty()
        })
    }

    fn cancel_all(&self) {
        for entry in self.runs.iter() {
            entry.value().iter().for_each(|(_, token)| token.cancel());
        }
    }

    fn is_triggered(&self, job_id: Uuid) -> bool {
        self.triggered.contains(&job_id)
    }
}

/// Unregisters a run when its worker ends, even by panic.
struct RunRegistration {
    registry: Arc<RunRegistry>,
    job_id: Uuid,
    run_id: u64,
    triggered: bool,
}

impl Drop for RunRegistration {
    fn drop(&mut self) {
        let emptied = match self.registry.runs.get_mut(&self.job_id) {
            Some(mut runs) => {
                runs.retain(|(id, _)| *id != self.run_id);
                runs.is_empty()
            }
            None => false,
        };
        if emptied {
            self.registry.runs.remove_if(&self.job_id, |_, runs| runs.is_empty());
        }
        if self.triggered {
            self.registry.triggered.remove(&self.job_id);
        }
    }
}

struct EngineShared {
    store: Arc<SqliteTriggerRepository>,
    runner: Arc<dyn JobRunner>,
    config: TriggerEngineConfig,
    semaphore: Arc<Semaphore>,
    runs: Arc<RunRegistry>,
}

/// Polling worker pool over the persistent trigger store
pub struct TriggerEngine {
    shared: Arc<EngineShared>,
    cancellation_token: parking_lot::Mutex<CancellationToken>,
    task_handle: TaskHandle,
    /// Set by `start`, cleared by `shutdown`.
    running: AtomicBool,
}

impl TriggerEngine {
    pub fn new(
        store: Arc<SqliteTriggerRepository>,
        runner: Arc<dyn JobRunner>,
        config: TriggerEngineConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        Self {
            shared: Arc::new(EngineShared {
                store,
                runner,
                config,
                semaphore,
                runs: Arc::new(RunRegistry::default()),
            }),
            cancellation_token: parking_lot::Mutex::new(CancellationToken::new()),
            task_handle: Arc::new(Mutex::new(None)),
            running: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<SqliteTriggerRepository> {
        &self.shared.store
    }

    /// Spawn the polling loop.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` when the loop is active.
    #[instrument(skip(self))]
    pub async fn start(&self) -> SchedulerResult<()> {
        if self.running.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return Err(SchedulerError::AlreadyRunning);
        }

        // Fresh token so the engine can be restarted after shutdown
        let cancel = CancellationToken::new();
        *self.cancellation_token.lock() = cancel.clone();

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            Self::poll_loop(shared, cancel).await;
        });
        *self.task_handle.lock().await = Some(handle);

        info!(
            poll_interval_ms = self.shared.config.poll_interval.as_millis() as u64,
            max_concurrency = self.shared.config.max_concurrency,
            "trigger_engine.started"
        );
        Ok(())
    }

    /// Stop polling, signal every executing run and wait for workers to
    /// drain.
    ///
    /// # Errors
    ///
    /// Returns `NotRunning` when the loop is not active, or `Timeout` when
    /// the loop or the workers outlive the join timeout.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> SchedulerResult<()> {
        if !self.running.swap(false, Ordering::AcqRel) {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation_token.lock().cancel();
        self.shared.runs.cancel_all();

        let join_timeout = self.shared.config.join_timeout;
        if let Some(handle) = self.task_handle.lock().await.take() {
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        let all_permits = u32::try_from(self.shared.config.max_concurrency.max(1)).unwrap_or(u32::MAX);
        let drained = tokio::time::timeout(join_timeout, self.shared.semaphore.acquire_many(all_permits))
            .await
            .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })?;
        drop(drained);

        info!("trigger_engine.stopped");
        Ok(())
    }

    /// True from a successful `start` until `shutdown` begins.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn pause_all(&self) -> Result<()> {
        self.shared.store.set_paused(true).await?;
        info!("trigger_engine.paused");
        Ok(())
    }

    pub async fn resume_all(&self) -> Result<()> {
        self.shared.store.set_paused(false).await?;
        info!("trigger_engine.resumed");
        Ok(())
    }

    pub async fn is_paused(&self) -> Result<bool> {
        self.shared.store.is_paused().await
    }

    /// Queue one out-of-band run of `job_id`. Returns immediately; the run
    /// waits for a worker slot like any trigger-fired run.
    pub fn fire_now(&self, job_id: Uuid) {
        info!(%job_id, "trigger_engine.fire_now");
        self.shared.dispatch(job_id, None, false);
    }

    /// Cancel the tokens of every executing or queued run of `job_id`.
    /// True when at least one run was signalled.
    pub fn stop_job(&self, job_id: Uuid) -> bool {
        let signalled = self.shared.runs.cancel_job(job_id);
        info!(%job_id, signalled, "trigger_engine.stop_job");
        signalled
    }

    /// True while a run of `job_id` is registered.
    pub fn has_active_run(&self, job_id: Uuid) -> bool {
        self.shared.runs.runs.contains_key(&job_id)
    }

    /// Evaluate due triggers once against `now`. Returns how many fired.
    pub async fn poll_once(&self, now: DateTime<Utc>) -> Result<usize> {
        let cancel = self.cancellation_token.lock().clone();
        self.shared.poll_once(now, &cancel).await
    }

    async fn poll_loop(shared: Arc<EngineShared>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("trigger_engine.loop_cancelled");
                    break;
                }
                _ = tokio::time::sleep(shared.config.poll_interval) => {
                    if let Err(e) = shared.poll_once(Utc::now(), &cancel).await {
                        warn!(error = %e, "trigger_engine.poll_failed");
                    }
                }
            }
        }
    }
}

impl Drop for TriggerEngine {
    fn drop(&mut self) {
        self.cancellation_token.get_mut().cancel();
    }
}

impl EngineShared {
    async fn poll_once(self: &Arc<Self>, now: DateTime<Utc>, cancel: &CancellationToken) -> Result<usize> {
        if self.store.is_paused().await? {
            return Ok(0);
        }

        let misfire_threshold =
            TimeDelta::from_std(self.config.misfire_threshold).unwrap_or(TimeDelta::MAX);
        let mut fired = 0;

        for trigger in self.store.due(now).await? {
            let job_id = trigger.job_id;
            if self.runs.is_triggered(job_id) {
                debug!(%job_id, "trigger_engine.still_running");
                continue;
            }

            let misfired = now - trigger.next_fire_at > misfire_threshold;
            let next = following_fire(&trigger, now);
            if misfired && !trigger.schedule.is_one_shot() {
                warn!(
                    %job_id,
                    scheduled_for = %trigger.next_fire_at,
                    "trigger_engine.misfire_skipped"
                );
                self.advance(&trigger, next).await?;
                continue;
            }

            let permit = tokio::select! {
                permit = Arc::clone(&self.semaphore).acquire_owned() => permit.ok(),
                _ = cancel.cancelled() => None,
            };
            let Some(permit) = permit else {
                break;
            };

            self.advance(&trigger, next).await?;
            debug!(%job_id, scheduled_for = %trigger.next_fire_at, "trigger_engine.fired");
            self.dispatch(job_id, Some(permit), true);
            fired += 1;
        }

        Ok(fired)
    }

    /// Move a fired or skipped trigger on. One-shot triggers and recurring
    /// ones with no further instant are removed.
    async fn advance(&self, trigger: &Trigger, next: Option<DateTime<Utc>>) -> Result<()> {
        match next {
            Some(next) => {
                self.store.set_next_fire(trigger.job_id, next).await?;
            }
            None => {
                self.store.remove(trigger.job_id).await?;
            }
        }
        Ok(())
    }

    fn dispatch(self: &Arc<Self>, job_id: Uuid, permit: Option<OwnedSemaphorePermit>, triggered: bool) {
        let token = CancellationToken::new();
        let registration = self.runs.register(job_id, token.clone(), triggered);
        let shared = Arc::clone(self);

        tokio::spawn(async move {
            let _registration = registration;
            let _permit = match permit {
                Some(permit) => permit,
                None => match Arc::clone(&shared.semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
            };

            match shared.runner.run_job(job_id, token).await {
                Ok(execution) => info!(
                    %job_id,
                    execution_id = %execution.id,
                    status = %execution.status,
                    "trigger_engine.run_finished"
                ),
                Err(e) => warn!(%job_id, error = %e, kind = e.label(), "trigger_engine.run_rejected"),
            }
        });
    }
}

/// Next instant for a trigger after it fires or misfires at `now`.
fn following_fire(trigger: &Trigger, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match &trigger.schedule {
        TriggerSchedule::Cron { expression } => match parse_cron(expression) {
            Ok(schedule) => next_fire_after(&schedule, now),
            Err(e) => {
                warn!(job_id = %trigger.job_id, error = %e, "trigger_engine.invalid_cron");
                None
            }
        },
        TriggerSchedule::Once { .. } => None,
    }
}

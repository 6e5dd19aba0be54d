//! Per-job trigger management over the trigger engine

use std::sync::Arc;

use arkive_core::schedule::plan_trigger;
use arkive_core::{JobRepository, JobSchedulerPort, SchedulerControl};
use arkive_domain::{Result, Trigger};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::error::SchedulerError;
use super::trigger_engine::TriggerEngine;

/// Keeps at most one trigger per job in the store and forwards run/stop
/// requests to the engine.
pub struct JobScheduler {
    jobs: Arc<dyn JobRepository>,
    engine: Arc<TriggerEngine>,
}

impl JobScheduler {
    pub fn new(jobs: Arc<dyn JobRepository>, engine: Arc<TriggerEngine>) -> Self {
        Self { jobs, engine }
    }

    pub fn engine(&self) -> &Arc<TriggerEngine> {
        &self.engine
    }

    /// Reschedule every active job, e.g. after startup.
    pub async fn schedule_all(&self) -> Result<usize> {
        let jobs = self.jobs.list_active_jobs().await?;
        let count = jobs.len();
        for job in jobs {
            self.schedule_job(job.id).await?;
        }
        Ok(count)
    }

    /// Stop the engine when it is running. A stopped engine is not an error.
    pub async fn shutdown(&self) -> Result<()> {
        match self.engine.shutdown().await {
            Ok(()) | Err(SchedulerError::NotRunning) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl JobSchedulerPort for JobScheduler {
    #[instrument(skip(self))]
    async fn schedule_job(&self, job_id: Uuid) -> Result<()> {
        let store = self.engine.store();
        store.remove(job_id).await?;

        let job = match self.jobs.get_job(job_id).await? {
            Some(job) if !job.is_deleted() => job,
            _ => {
                debug!(%job_id, "scheduler.schedule.job_missing");
                return Ok(());
            }
        };

        match plan_trigger(&job, Utc::now()) {
            Some((schedule, next_fire_at)) => {
                store.upsert(&Trigger::new(job_id, schedule, next_fire_at)).await?;
                info!(%job_id, %next_fire_at, "scheduler.schedule.registered");
            }
            None => {
                debug!(%job_id, trigger_type = %job.trigger_type, enabled = job.enabled, "scheduler.schedule.none");
            }
        }
        Ok(())
    }

    async fn run_now(&self, job_id: Uuid) -> Result<()> {
        self.engine.fire_now(job_id);
        Ok(())
    }

    async fn stop_job(&self, job_id: Uuid) -> Result<bool> {
        Ok(self.engine.stop_job(job_id))
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<bool> {
        let existed = self.engine.store().remove(job_id).await?;
        info!(%job_id, existed, "scheduler.delete");
        Ok(existed)
    }
}

#[async_trait]
impl SchedulerControl for JobScheduler {
    async fn is_started(&self) -> Result<bool> {
        Ok(self.engine.is_running())
    }

    async fn start(&self) -> Result<()> {
        match self.engine.start().await {
            Ok(()) | Err(SchedulerError::AlreadyRunning) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn pause_all(&self) -> Result<()> {
        self.engine.pause_all().await
    }

    async fn resume_all(&self) -> Result<()> {
        self.engine.resume_all().await
    }
}

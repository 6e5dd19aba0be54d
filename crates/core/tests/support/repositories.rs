//! In-memory repository implementations for testing

use std::collections::HashMap;
use std::sync::Arc;

use arkive_core::{ApplicationLogRepository, ExecutionRepository, JobRepository, SettingsRepository};
use arkive_domain::{
    ApplicationLog, ArkiveError, Execution, ExecutionLog, ExclusionPattern, Job, LogLevel, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

/// In-memory `JobRepository`. Global patterns are appended on load.
#[derive(Default, Clone)]
pub struct InMemoryJobRepository {
    jobs: Arc<Mutex<HashMap<Uuid, Job>>>,
    patterns: Arc<Mutex<Vec<ExclusionPattern>>>,
}

impl InMemoryJobRepository {
    pub fn with_job(self, job: Job) -> Self {
        self.jobs.lock().insert(job.id, job);
        self
    }

    pub fn with_pattern(self, pattern: ExclusionPattern) -> Self {
        self.patterns.lock().push(pattern);
        self
    }

    /// Stored row without global patterns appended.
    pub fn stored(&self, id: Uuid) -> Option<Job> {
        self.jobs.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        let globals: Vec<ExclusionPattern> =
            self.patterns.lock().iter().filter(|p| p.is_global).cloned().collect();
        Ok(self.jobs.lock().get(&id).cloned().map(|mut job| {
            job.exclusion_patterns.extend(globals);
            job
        }))
    }

    async fn list_active_jobs(&self) -> Result<Vec<Job>> {
        Ok(self.jobs.lock().values().filter(|job| !job.is_deleted()).cloned().collect())
    }

    async fn insert_job(&self, job: &Job) -> Result<()> {
        self.jobs.lock().insert(job.id, job.clone());
        Ok(())
    }

    async fn update_job(&self, job: &Job) -> Result<()> {
        let mut jobs = self.jobs.lock();
        match jobs.get_mut(&job.id) {
            Some(stored) => {
                *stored = job.clone();
                Ok(())
            }
            None => Err(ArkiveError::NotFound(format!("job {}", job.id))),
        }
    }

    async fn name_exists(&self, name: &str, excluding: Option<Uuid>) -> Result<bool> {
        let needle = name.trim().to_lowercase();
        Ok(self.jobs.lock().values().any(|job| {
            !job.is_deleted() && Some(job.id) != excluding && job.name.to_lowercase() == needle
        }))
    }

    async fn set_enabled(&self, id: Uuid, enabled: bool, modified_at: DateTime<Utc>) -> Result<bool> {
        Ok(self
            .jobs
            .lock()
            .get_mut(&id)
            .filter(|job| !job.is_deleted())
            .map(|job| {
                job.enabled = enabled;
                job.modified_at = modified_at;
            })
            .is_some())
    }

    async fn soft_delete(&self, id: Uuid, deleted_at: DateTime<Utc>) -> Result<bool> {
        Ok(self
            .jobs
            .lock()
            .get_mut(&id)
            .filter(|job| !job.is_deleted())
            .map(|job| {
                job.deleted_at = Some(deleted_at);
                job.modified_at = deleted_at;
            })
            .is_some())
    }

    async fn mark_last_run(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        if let Some(job) = self.jobs.lock().get_mut(&id) {
            job.last_run_at = Some(at);
        }
        Ok(())
    }

    async fn list_exclusion_patterns(&self) -> Result<Vec<ExclusionPattern>> {
        Ok(self.patterns.lock().clone())
    }

    async fn save_exclusion_pattern(&self, pattern: &ExclusionPattern) -> Result<()> {
        let mut patterns = self.patterns.lock();
        patterns.retain(|p| p.id != pattern.id);
        patterns.push(pattern.clone());
        Ok(())
    }

    async fn delete_exclusion_pattern(&self, id: Uuid) -> Result<bool> {
        let mut patterns = self.patterns.lock();
        let before = patterns.len();
        patterns.retain(|p| p.id != id);
        Ok(patterns.len() != before)
    }
}

/// In-memory `ExecutionRepository`.
#[derive(Default, Clone)]
pub struct InMemoryExecutionRepository {
    executions: Arc<Mutex<HashMap<Uuid, Execution>>>,
    logs: Arc<Mutex<Vec<ExecutionLog>>>,
    complete_failure: Arc<Mutex<Option<ArkiveError>>>,
}

impl InMemoryExecutionRepository {
    /// Every `complete_execution` call fails with `err`.
    pub fn failing_complete(self, err: ArkiveError) -> Self {
        *self.complete_failure.lock() = Some(err);
        self
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.executions.lock().values().cloned().collect()
    }

    pub fn all_logs(&self) -> Vec<ExecutionLog> {
        self.logs.lock().clone()
    }

    pub fn seed_log(&self, log: ExecutionLog) {
        self.logs.lock().push(log);
    }
}

#[async_trait]
impl ExecutionRepository for InMemoryExecutionRepository {
    async fn insert_execution(&self, execution: &Execution) -> Result<()> {
        self.executions.lock().insert(execution.id, execution.clone());
        Ok(())
    }

    async fn complete_execution(&self, execution: &Execution, logs: &[ExecutionLog]) -> Result<()> {
        if let Some(err) = self.complete_failure.lock().clone() {
            return Err(err);
        }
        self.executions.lock().insert(execution.id, execution.clone());
        self.logs.lock().extend_from_slice(logs);
        Ok(())
    }

    async fn get_execution(&self, id: Uuid) -> Result<Option<Execution>> {
        Ok(self.executions.lock().get(&id).cloned())
    }

    async fn list_executions(&self, job_id: Uuid, limit: u32) -> Result<Vec<Execution>> {
        let mut executions: Vec<Execution> =
            self.executions.lock().values().filter(|e| e.job_id == job_id).cloned().collect();
        executions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        executions.truncate(limit as usize);
        Ok(executions)
    }

    async fn list_logs(&self, execution_id: Uuid) -> Result<Vec<ExecutionLog>> {
        let mut logs: Vec<ExecutionLog> =
            self.logs.lock().iter().filter(|l| l.execution_id == execution_id).cloned().collect();
        logs.sort_by_key(|l| l.timestamp);
        Ok(logs)
    }

    async fn list_issue_logs(&self, execution_id: Uuid) -> Result<Vec<ExecutionLog>> {
        Ok(self
            .list_logs(execution_id)
            .await?
            .into_iter()
            .filter(|l| matches!(l.level, LogLevel::Error | LogLevel::Warning))
            .collect())
    }

    async fn delete_logs_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut logs = self.logs.lock();
        let before = logs.len();
        logs.retain(|l| l.timestamp >= cutoff);
        Ok((before - logs.len()) as u64)
    }
}

/// In-memory `ApplicationLogRepository`.
#[derive(Default, Clone)]
pub struct InMemoryApplicationLogRepository {
    logs: Arc<Mutex<Vec<ApplicationLog>>>,
}

impl InMemoryApplicationLogRepository {
    pub fn all(&self) -> Vec<ApplicationLog> {
        self.logs.lock().clone()
    }
}

#[async_trait]
impl ApplicationLogRepository for InMemoryApplicationLogRepository {
    async fn append_application_logs(&self, logs: &[ApplicationLog]) -> Result<()> {
        let mut stored = self.logs.lock();
        for log in logs {
            let mut log = log.clone();
            log.id = stored.len() as i64 + 1;
            stored.push(log);
        }
        Ok(())
    }

    async fn list_application_logs(&self, limit: u32) -> Result<Vec<ApplicationLog>> {
        let mut logs = self.logs.lock().clone();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        logs.truncate(limit as usize);
        Ok(logs)
    }

    async fn delete_application_logs_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut logs = self.logs.lock();
        let before = logs.len();
        logs.retain(|l| l.timestamp >= cutoff);
        Ok((before - logs.len()) as u64)
    }
}

/// In-memory `SettingsRepository`.
#[derive(Default, Clone)]
pub struct InMemorySettingsRepository {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemorySettingsRepository {
    pub fn with(self, key: &str, value: &str) -> Self {
        self.values.lock().insert(key.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_settings(&self, values: Vec<(String, String)>) -> Result<()> {
        self.values.lock().extend(values);
        Ok(())
    }

    async fn list_settings(&self) -> Result<Vec<(String, String)>> {
        Ok(self.values.lock().iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

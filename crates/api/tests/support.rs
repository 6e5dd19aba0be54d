//! Shared helpers for `arkive-app` integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arkive_domain::{Config, DatabaseConfig, Execution, JobDraft, SchedulerConfig};
use arkive_lib::{list_executions, AppContext};
use tempfile::TempDir;
use uuid::Uuid;

/// Fully wired application over a temporary database, lock directory and
/// source/destination trees.
pub struct TestApp {
    pub ctx: AppContext,
    pub source: PathBuf,
    pub destination: PathBuf,
    temp_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let config = test_config(temp_dir.path());
        let ctx = AppContext::new_with_config_in_lock_dir(config, temp_dir.path().join("lock"))
            .await
            .expect("application context should initialise");

        let source = temp_dir.path().join("source");
        let destination = temp_dir.path().join("destination");
        fs::create_dir_all(&source).expect("source root should be created");

        Self { ctx, source, destination, temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_source(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.source.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dirs should be created");
        }
        fs::write(&path, contents).expect("source file should be written");
        path
    }

    pub fn read_destination(&self, relative: &str) -> String {
        fs::read_to_string(self.destination.join(relative)).expect("destination file should be readable")
    }

    /// Manual job over this app's source and destination trees.
    pub fn draft(&self, name: &str) -> JobDraft {
        JobDraft::new(name, self.source.to_string_lossy(), self.destination.to_string_lossy())
    }

    /// Poll until the job has a finished execution.
    pub async fn wait_for_finished_execution(&self, job_id: Uuid) -> Execution {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let history = list_executions(&self.ctx, job_id, None).await.expect("history should load");
            if let Some(done) = history.into_iter().find(|e| e.status.is_terminal()) {
                return done;
            }
            assert!(tokio::time::Instant::now() < deadline, "job {job_id} did not finish in time");
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }

    pub async fn shutdown(self) {
        self.ctx.shutdown().await.expect("shutdown should succeed");
    }
}

pub fn test_config(root: &Path) -> Config {
    Config {
        database: DatabaseConfig {
            path: root.join("arkive.db").to_string_lossy().into_owned(),
            pool_size: 4,
            ..DatabaseConfig::default()
        },
        scheduler: SchedulerConfig { poll_interval_ms: 25, ..SchedulerConfig::default() },
        ..Config::default()
    }
}

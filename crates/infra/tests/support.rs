//! Shared helpers for `arkive-infra` integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arkive_domain::{Job, JobDraft};
use arkive_infra::database::DbManager;
use chrono::Utc;
use filetime::FileTime;
use tempfile::TempDir;
use uuid::Uuid;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a migrated temporary database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("test.db");

        let manager =
            DbManager::new(&db_path, 4, Duration::from_secs(5)).expect("db manager should be created");
        manager.run_migrations().expect("migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.manager.path()
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Source and destination roots under one temporary directory.
pub struct TestTree {
    pub source: PathBuf,
    pub destination: PathBuf,
    _temp_dir: TempDir,
}

impl TestTree {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let source = temp_dir.path().join("source");
        let destination = temp_dir.path().join("destination");
        fs::create_dir_all(&source).expect("source root should be created");

        Self { source, destination, _temp_dir: temp_dir }
    }

    pub fn write_source(&self, relative: &str, contents: &str) -> PathBuf {
        write_file(&self.source.join(relative), contents)
    }

    pub fn write_destination(&self, relative: &str, contents: &str) -> PathBuf {
        write_file(&self.destination.join(relative), contents)
    }

    pub fn destination_file(&self, relative: &str) -> PathBuf {
        self.destination.join(relative)
    }

    pub fn read_destination(&self, relative: &str) -> String {
        fs::read_to_string(self.destination.join(relative)).expect("destination file should be readable")
    }

    /// Names of every file directly inside `dir` of the destination.
    pub fn destination_names(&self, dir: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.destination.join(dir))
            .expect("destination dir should be listable")
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn job(&self) -> Job {
        job_for(&self.source, &self.destination)
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

pub fn write_file(path: &Path, contents: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dirs should be created");
    }
    fs::write(path, contents).expect("file should be written");
    path.to_path_buf()
}

pub fn set_mtime(path: &Path, unix_seconds: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(unix_seconds, 0)).expect("mtime should be set");
}

pub fn job_for(source: &Path, destination: &Path) -> Job {
    let draft = JobDraft::new("tree", source.to_string_lossy(), destination.to_string_lossy());
    job_from_draft(&draft)
}

/// Persisted-looking job built from `draft`.
pub fn job_from_draft(draft: &JobDraft) -> Job {
    let now = Utc::now();
    Job {
        id: Uuid::now_v7(),
        name: draft.name.clone(),
        description: draft.description.clone(),
        source_path: draft.source_path.clone(),
        destination_path: draft.destination_path.clone(),
        enabled: draft.enabled,
        sync_mode: draft.sync_mode,
        comparison_method: draft.comparison_method,
        overwrite_behavior: draft.overwrite_behavior,
        trigger_type: draft.trigger_type,
        cron_expression: draft.cron_expression.clone(),
        one_time_at: draft.one_time_at,
        notify_on_start: draft.notify_on_start,
        notify_on_complete: draft.notify_on_complete,
        notify_on_fail: draft.notify_on_fail,
        sync_options: Some(draft.sync_options),
        exclusion_patterns: Vec::new(),
        created_at: now,
        modified_at: now,
        deleted_at: None,
        last_run_at: None,
    }
}

pub fn named_job(name: &str) -> Job {
    job_from_draft(&JobDraft::new(name, format!("/data/{name}"), format!("/backup/{name}")))
}

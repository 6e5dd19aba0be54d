//! Filesystem implementation of the sync engine
//!
//! One pass walks the source tree, asks the decision function what to do
//! with every remaining file and executes it, then optionally deletes
//! orphans from the destination. Each file operation is isolated: a failure
//! is counted and logged and the walk moves on. Only a missing source or an
//! unusable destination root ends the pass early, and cancellation is
//! observed between files.

use std::collections::HashSet;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use arkive_core::{decide, GlobMatcher, SyncAction, SyncEngine, SyncLogEntry, SyncResult};
use arkive_domain::{
    ComparisonMethod, Job, OperationType, OverwriteBehavior, Result, SyncCounters, SyncMode,
    SyncOptions,
};
use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use walkdir::WalkDir;

use super::errors::SyncError;
use super::fs_ops::{
    contents_match, copy_with_metadata, is_hidden_or_system, keep_both_path, orphan_key,
    relative_key, remove_file, snapshot, snapshot_if_file,
};
use crate::errors::map_join_error;

/// Everything a pass needs from the job, detached from it so it can move
/// onto a blocking thread.
#[derive(Debug, Clone)]
pub(crate) struct SyncPlan {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub mode: SyncMode,
    pub method: ComparisonMethod,
    pub overwrite: OverwriteBehavior,
    pub options: SyncOptions,
    pub exclusions: GlobMatcher,
}

impl SyncPlan {
    pub fn from_job(job: &Job) -> Self {
        Self {
            source: PathBuf::from(job.source_path.trim()),
            destination: PathBuf::from(job.destination_path.trim()),
            mode: job.sync_mode,
            method: job.comparison_method,
            overwrite: job.overwrite_behavior,
            options: job.effective_options(),
            exclusions: GlobMatcher::new(&job.exclusion_globs()),
        }
    }

    pub fn deletes_orphans(&self) -> bool {
        match self.mode {
            SyncMode::Mirror => true,
            SyncMode::Incremental => self.options.delete_orphaned,
        }
    }

    /// Files below `root`, in file-name order, honouring the recursion option.
    pub fn walk(&self, root: &Path) -> walkdir::IntoIter {
        let max_depth = if self.options.recursive { usize::MAX } else { 1 };
        WalkDir::new(root).min_depth(1).max_depth(max_depth).follow_links(true).sort_by_file_name().into_iter()
    }

    /// Source-side filter: exclusion globs first, then hidden/system files.
    pub fn filters_out(&self, key: &str, metadata: &Metadata) -> bool {
        self.exclusions.is_match(key)
            || (self.options.skip_hidden_and_system && is_hidden_or_system(key, metadata))
    }
}

/// Sync engine over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemSyncEngine;

impl FileSystemSyncEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SyncEngine for FileSystemSyncEngine {
    #[instrument(skip(self, job, cancel), fields(job_id = %job.id))]
    async fn execute(&self, job: &Job, cancel: CancellationToken) -> Result<SyncResult> {
        let plan = SyncPlan::from_job(job);
        let result = tokio::task::spawn_blocking(move || run_pass(&plan, &cancel))
            .await
            .map_err(map_join_error)??;

        let counters = &result.counters;
        info!(
            scanned = counters.files_scanned,
            copied = counters.files_copied,
            updated = counters.files_updated,
            deleted = counters.files_deleted,
            skipped = counters.files_skipped,
            failed = counters.files_failed,
            bytes = counters.bytes_transferred,
            "sync.pass_completed"
        );
        Ok(result)
    }
}

pub(crate) fn run_pass(plan: &SyncPlan, cancel: &CancellationToken) -> std::result::Result<SyncResult, SyncError> {
    let source_meta = fs::metadata(&plan.source)
        .map_err(|_| SyncError::SourceMissing(plan.source.display().to_string()))?;

    if source_meta.is_file() {
        return single_file(plan, &source_meta, cancel);
    }
    if !source_meta.is_dir() {
        return Err(SyncError::SourceMissing(plan.source.display().to_string()));
    }

    create_destination(&plan.destination)?;

    let mut pass = SyncPass::default();
    let mut seen = HashSet::new();

    for entry in plan.walk(&plan.source) {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                pass.walk_failed(&plan.source, &err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(key) = relative_key(&plan.source, entry.path()) else {
            continue;
        };
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                // Unreadable sources still protect their destination copy
                seen.insert(orphan_key(&key));
                pass.fail(&key, OperationType::Copy, "Failed to read file metadata", &err);
                continue;
            }
        };

        if plan.filters_out(&key, &metadata) {
            pass.counters.files_skipped += 1;
            continue;
        }

        seen.insert(orphan_key(&key));
        pass.counters.files_scanned += 1;
        pass.sync_file(plan, entry.path(), &metadata, &key);
    }

    if plan.deletes_orphans() {
        pass.delete_orphans(plan, &seen, cancel)?;
    }

    Ok(pass.into_result())
}

/// A file source is copied into the destination directory under its own
/// name. No filters or orphan handling apply.
fn single_file(
    plan: &SyncPlan,
    metadata: &Metadata,
    cancel: &CancellationToken,
) -> std::result::Result<SyncResult, SyncError> {
    let Some(key) = plan.source.file_name().map(|name| name.to_string_lossy().into_owned()) else {
        return Err(SyncError::SourceMissing(plan.source.display().to_string()));
    };
    create_destination(&plan.destination)?;
    if cancel.is_cancelled() {
        return Err(SyncError::Cancelled);
    }

    let mut pass = SyncPass::default();
    pass.counters.files_scanned = 1;
    pass.sync_file(plan, &plan.source, metadata, &key);
    Ok(pass.into_result())
}

fn create_destination(destination: &Path) -> std::result::Result<(), SyncError> {
    fs::create_dir_all(destination).map_err(|source| SyncError::DestinationUnavailable {
        path: destination.display().to_string(),
        source,
    })
}

#[derive(Debug, Default)]
struct SyncPass {
    counters: SyncCounters,
    entries: Vec<SyncLogEntry>,
}

impl SyncPass {
    fn sync_file(&mut self, plan: &SyncPlan, source: &Path, metadata: &Metadata, key: &str) {
        let destination = plan.destination.join(key);

        let source_snapshot = match snapshot(source, metadata) {
            Ok(snapshot) => snapshot,
            Err(err) => return self.fail(key, OperationType::Copy, "Failed to read file metadata", &err),
        };
        let destination_snapshot = match snapshot_if_file(&destination) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                return self.fail(key, OperationType::Copy, "Failed to read destination metadata", &err)
            }
        };

        let action =
            decide(&source_snapshot, destination_snapshot.as_ref(), plan.mode, plan.method, plan.overwrite);
        match action {
            SyncAction::Skip => self.counters.files_skipped += 1,
            SyncAction::Copy => self.transfer(plan, source, &destination, key, OperationType::Copy),
            SyncAction::Update => {
                let target = match plan.overwrite {
                    OverwriteBehavior::KeepBoth if destination_snapshot.is_some() => {
                        keep_both_path(&destination, Utc::now())
                    }
                    OverwriteBehavior::KeepBoth | OverwriteBehavior::AlwaysOverwrite => destination,
                };
                self.transfer(plan, source, &target, key, OperationType::Update);
            }
        }
    }

    fn transfer(&mut self, plan: &SyncPlan, source: &Path, target: &Path, key: &str, operation: OperationType) {
        let bytes = match copy_with_metadata(source, target) {
            Ok(bytes) => bytes,
            Err(err) => {
                let message = match operation {
                    OperationType::Update => "Failed to update file",
                    OperationType::Copy | OperationType::Delete | OperationType::Skip => "Failed to copy file",
                };
                return self.fail(key, operation, message, &err);
            }
        };

        match operation {
            OperationType::Update => self.counters.files_updated += 1,
            OperationType::Copy | OperationType::Delete | OperationType::Skip => {
                self.counters.files_copied += 1
            }
        }
        self.counters.bytes_transferred += bytes;
        let message = format!("{} {}", past_tense(operation), target.display());
        self.entries.push(SyncLogEntry::info(message, key, operation));

        if plan.options.verify_after_copy {
            self.verify(source, target, key, operation);
        }
    }

    fn verify(&mut self, source: &Path, target: &Path, key: &str, operation: OperationType) {
        match contents_match(source, target) {
            Ok(true) => {}
            Ok(false) => {
                self.counters.warning_count += 1;
                self.counters.files_failed += 1;
                self.counters.error_count += 1;
                self.entries.push(SyncLogEntry::error(
                    "Verification failed: checksum mismatch",
                    key,
                    operation,
                    format!("SHA-256 of {} differs from its source", target.display()),
                ));
            }
            Err(err) => self.fail(key, operation, "Verification failed", &err),
        }
    }

    fn delete_orphans(
        &mut self,
        plan: &SyncPlan,
        seen: &HashSet<String>,
        cancel: &CancellationToken,
    ) -> std::result::Result<(), SyncError> {
        for entry in plan.walk(&plan.destination) {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.walk_failed(&plan.destination, &err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(key) = relative_key(&plan.destination, entry.path()) else {
                continue;
            };
            if plan.exclusions.is_match(&key) || seen.contains(&orphan_key(&key)) {
                continue;
            }

            match remove_file(entry.path()) {
                Ok(()) => {
                    self.counters.files_deleted += 1;
                    self.entries.push(SyncLogEntry::info(
                        format!("Deleted orphaned file {}", entry.path().display()),
                        key,
                        OperationType::Delete,
                    ));
                }
                Err(err) => self.fail(&key, OperationType::Delete, "Failed to delete orphan", &err),
            }
        }
        Ok(())
    }

    fn walk_failed(&mut self, root: &Path, err: &walkdir::Error) {
        let key = err
            .path()
            .and_then(|path| relative_key(root, path))
            .unwrap_or_else(|| root.display().to_string());
        self.fail(&key, OperationType::Copy, "Failed to read directory entry", err);
    }

    fn fail(&mut self, key: &str, operation: OperationType, message: &str, err: &dyn std::error::Error) {
        self.counters.files_failed += 1;
        self.counters.error_count += 1;
        self.entries.push(SyncLogEntry::error(message, key, operation, err.to_string()));
    }

    fn into_result(self) -> SyncResult {
        SyncResult { counters: self.counters, entries: self.entries }
    }
}

fn past_tense(operation: OperationType) -> &'static str {
    match operation {
        OperationType::Copy => "Copied",
        OperationType::Update => "Updated",
        OperationType::Delete => "Deleted",
        OperationType::Skip => "Skipped",
    }
}

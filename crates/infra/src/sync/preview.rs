//! Dry-run preview of a job
//!
//! Walks both trees with the same filters and decision function as a real
//! pass, but touches nothing.

use std::collections::HashSet;

use arkive_core::{decide, SyncAction};
use arkive_domain::{Job, Result};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::engine::SyncPlan;
use super::errors::SyncError;
use super::fs_ops::{orphan_key, relative_key, snapshot, snapshot_if_file};
use crate::errors::map_join_error;

/// What a run of the job would do right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPreview {
    pub files_to_add: u32,
    pub files_to_update: u32,
    pub files_to_delete: u32,
    pub files_unchanged: u32,
    pub files_skipped: u32,
    /// Files whose metadata could not be read.
    pub files_unreadable: u32,
    pub bytes_to_transfer: u64,
}

/// Build a preview of `job` on a blocking thread.
///
/// # Errors
///
/// Fails like a real run when the source path does not exist.
#[instrument(skip(job), fields(job_id = %job.id))]
pub async fn preview_job(job: &Job) -> Result<JobPreview> {
    let plan = SyncPlan::from_job(job);
    let preview = tokio::task::spawn_blocking(move || build_preview(&plan)).await.map_err(map_join_error)??;
    Ok(preview)
}

pub(crate) fn build_preview(plan: &SyncPlan) -> std::result::Result<JobPreview, SyncError> {
    let source_meta = std::fs::metadata(&plan.source)
        .map_err(|_| SyncError::SourceMissing(plan.source.display().to_string()))?;
    let mut preview = JobPreview::default();

    if source_meta.is_file() {
        let name = plan.source.file_name().map(|name| name.to_string_lossy().into_owned());
        let Some(name) = name else {
            return Err(SyncError::SourceMissing(plan.source.display().to_string()));
        };
        preview.count(plan, &plan.source, &source_meta, &name);
        return Ok(preview);
    }
    if !source_meta.is_dir() {
        return Err(SyncError::SourceMissing(plan.source.display().to_string()));
    }

    let mut seen = HashSet::new();
    for entry in plan.walk(&plan.source).filter_map(std::result::Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(key) = relative_key(&plan.source, entry.path()) else {
            continue;
        };
        let Ok(metadata) = entry.metadata() else {
            seen.insert(orphan_key(&key));
            preview.files_unreadable += 1;
            continue;
        };
        if plan.filters_out(&key, &metadata) {
            preview.files_skipped += 1;
            continue;
        }
        preview.count(plan, entry.path(), &metadata, &key);
        seen.insert(orphan_key(&key));
    }

    if plan.deletes_orphans() && plan.destination.is_dir() {
        preview.files_to_delete = plan
            .walk(&plan.destination)
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| relative_key(&plan.destination, entry.path()))
            .filter(|key| !plan.exclusions.is_match(key) && !seen.contains(&orphan_key(key)))
            .count()
            .try_into()
            .unwrap_or(u32::MAX);
    }

    Ok(preview)
}

impl JobPreview {
    fn count(&mut self, plan: &SyncPlan, source: &std::path::Path, metadata: &std::fs::Metadata, key: &str) {
        let destination = plan.destination.join(key);
        let (Ok(source_snapshot), Ok(destination_snapshot)) =
            (snapshot(source, metadata), snapshot_if_file(&destination))
        else {
            self.files_unreadable += 1;
            return;
        };

        match decide(&source_snapshot, destination_snapshot.as_ref(), plan.mode, plan.method, plan.overwrite) {
            SyncAction::Copy => {
                self.files_to_add += 1;
                self.bytes_to_transfer += source_snapshot.size;
            }
            SyncAction::Update => {
                self.files_to_update += 1;
                self.bytes_to_transfer += source_snapshot.size;
            }
            SyncAction::Skip => self.files_unchanged += 1,
        }
    }
}

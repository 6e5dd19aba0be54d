//! Shared test helpers for `arkive-core` integration tests.
//!
//! In-memory implementations of the core ports so service tests can focus on
//! behaviour instead of storage.

#![allow(dead_code)]

pub mod engine;
pub mod repositories;

use arkive_domain::{Job, JobDraft};
use chrono::Utc;
use uuid::Uuid;

/// Persisted-looking job built from `draft` with fixed timestamps.
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

pub fn sample_job(name: &str) -> Job {
    job_from_draft(&JobDraft::new(name, format!("/data/{name}"), format!("/backup/{name}")))
}

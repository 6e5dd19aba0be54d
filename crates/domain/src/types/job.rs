//! Backup job model
//!
//! A job describes one source → destination pairing together with how it is
//! compared, how conflicts are written, and when it runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_domain_enum_conversions;
use crate::types::trigger::trigger_key;

/// How the destination relates to the source after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Destination becomes an exact copy; orphans are deleted.
    Mirror,
    /// New and changed files are copied; nothing is deleted unless the
    /// delete-orphaned option is set.
    Incremental,
}

impl_domain_enum_conversions!(SyncMode {
    Mirror => "mirror",
    Incremental => "incremental",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMethod {
    Fast,
    Accurate,
}

impl_domain_enum_conversions!(ComparisonMethod {
    Fast => "fast",
    Accurate => "accurate",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwriteBehavior {
    AlwaysOverwrite,
    /// Updates land in a timestamped sibling instead of replacing the file.
    KeepBoth,
}

impl_domain_enum_conversions!(OverwriteBehavior {
    AlwaysOverwrite => "always_overwrite",
    KeepBoth => "keep_both",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Recurring,
    OneTime,
    Manual,
}

impl_domain_enum_conversions!(TriggerType {
    Recurring => "recurring",
    OneTime => "one_time",
    Manual => "manual",
});

/// Per-job synchronization switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    pub recursive: bool,
    pub delete_orphaned: bool,
    pub skip_hidden_and_system: bool,
    pub verify_after_copy: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            delete_orphaned: false,
            skip_hidden_and_system: true,
            verify_after_copy: false,
        }
    }
}

/// Named glob, either global or associated with specific jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionPattern {
    pub id: Uuid,
    pub name: String,
    pub pattern: String,
    pub is_global: bool,
}

impl ExclusionPattern {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, is_global: bool) -> Self {
        Self { id: Uuid::now_v7(), name: name.into(), pattern: pattern.into(), is_global }
    }
}

/// Persisted backup job.
///
/// When loaded for execution, `exclusion_patterns` holds the job-scoped
/// patterns followed by every global pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub source_path: String,
    pub destination_path: String,
    pub enabled: bool,
    pub sync_mode: SyncMode,
    pub comparison_method: ComparisonMethod,
    pub overwrite_behavior: OverwriteBehavior,
    pub trigger_type: TriggerType,
    /// Set iff `trigger_type` is `Recurring`.
    pub cron_expression: Option<String>,
    /// Set iff `trigger_type` is `OneTime`.
    pub one_time_at: Option<DateTime<Utc>>,
    pub notify_on_start: Option<bool>,
    pub notify_on_complete: Option<bool>,
    pub notify_on_fail: Option<bool>,
    pub sync_options: Option<SyncOptions>,
    pub exclusion_patterns: Vec<ExclusionPattern>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Stored options, or the defaults when the job has none.
    pub fn effective_options(&self) -> SyncOptions {
        self.sync_options.unwrap_or_default()
    }

    pub fn trigger_key(&self) -> String {
        trigger_key(self.id)
    }

    /// Glob strings of every exclusion that applies to this job.
    pub fn exclusion_globs(&self) -> Vec<String> {
        self.exclusion_patterns.iter().map(|p| p.pattern.clone()).collect()
    }
}

/// Editable fields of a job, validated by the job state service before
/// anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDraft {
    pub name: String,
    pub description: Option<String>,
    pub source_path: String,
    pub destination_path: String,
    pub enabled: bool,
    pub sync_mode: SyncMode,
    pub comparison_method: ComparisonMethod,
    pub overwrite_behavior: OverwriteBehavior,
    pub trigger_type: TriggerType,
    pub cron_expression: Option<String>,
    pub one_time_at: Option<DateTime<Utc>>,
    pub notify_on_start: Option<bool>,
    pub notify_on_complete: Option<bool>,
    pub notify_on_fail: Option<bool>,
    pub sync_options: SyncOptions,
    /// Ids of job-scoped exclusion patterns to associate.
    pub exclusion_pattern_ids: Vec<Uuid>,
}

impl JobDraft {
    /// Manual incremental job with default options.
    pub fn new(
        name: impl Into<String>,
        source_path: impl Into<String>,
        destination_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            source_path: source_path.into(),
            destination_path: destination_path.into(),
            enabled: true,
            sync_mode: SyncMode::Incremental,
            comparison_method: ComparisonMethod::Fast,
            overwrite_behavior: OverwriteBehavior::AlwaysOverwrite,
            trigger_type: TriggerType::Manual,
            cron_expression: None,
            one_time_at: None,
            notify_on_start: None,
            notify_on_complete: None,
            notify_on_fail: None,
            sync_options: SyncOptions::default(),
            exclusion_pattern_ids: Vec::new(),
        }
    }
}

impl From<&Job> for JobDraft {
    fn from(job: &Job) -> Self {
        Self {
            name: job.name.clone(),
            description: job.description.clone(),
            source_path: job.source_path.clone(),
            destination_path: job.destination_path.clone(),
            enabled: job.enabled,
            sync_mode: job.sync_mode,
            comparison_method: job.comparison_method,
            overwrite_behavior: job.overwrite_behavior,
            trigger_type: job.trigger_type,
            cron_expression: job.cron_expression.clone(),
            one_time_at: job.one_time_at,
            notify_on_start: job.notify_on_start,
            notify_on_complete: job.notify_on_complete,
            notify_on_fail: job.notify_on_fail,
            sync_options: job.effective_options(),
            exclusion_pattern_ids: job
                .exclusion_patterns
                .iter()
                .filter(|p| !p.is_global)
                .map(|p| p.id)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_options_default_values() {
        let options = SyncOptions::default();
        assert!(options.recursive);
        assert!(!options.delete_orphaned);
        assert!(options.skip_hidden_and_system);
        assert!(!options.verify_after_copy);
    }

    #[test]
    fn enum_tokens_parse_back() {
        assert_eq!("keep_both".parse::<OverwriteBehavior>(), Ok(OverwriteBehavior::KeepBoth));
        assert_eq!("ONE_TIME".parse::<TriggerType>(), Ok(TriggerType::OneTime));
        assert_eq!(SyncMode::Mirror.to_string(), "mirror");
    }

    #[test]
    fn draft_from_job_keeps_only_scoped_patterns() {
        let scoped = ExclusionPattern::new("temp", "*.tmp", false);
        let global = ExclusionPattern::new("logs", "*.log", true);
        let now = Utc::now();
        let job = Job {
            id: Uuid::now_v7(),
            name: "Docs".into(),
            description: None,
            source_path: "/src".into(),
            destination_path: "/dst".into(),
            enabled: true,
            sync_mode: SyncMode::Mirror,
            comparison_method: ComparisonMethod::Fast,
            overwrite_behavior: OverwriteBehavior::AlwaysOverwrite,
            trigger_type: TriggerType::Manual,
            cron_expression: None,
            one_time_at: None,
            notify_on_start: None,
            notify_on_complete: None,
            notify_on_fail: None,
            sync_options: None,
            exclusion_patterns: vec![scoped.clone(), global],
            created_at: now,
            modified_at: now,
            deleted_at: None,
            last_run_at: None,
        };

        let draft = JobDraft::from(&job);
        assert_eq!(draft.exclusion_pattern_ids, vec![scoped.id]);
        assert_eq!(draft.sync_options, SyncOptions::default());
        assert_eq!(job.exclusion_globs(), vec!["*.tmp".to_string(), "*.log".to_string()]);
    }
}

//! Persisted scheduler triggers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::TRIGGER_KEY_PREFIX;

/// Deterministic trigger key for a job.
pub fn trigger_key(job_id: Uuid) -> String {
    format!("{TRIGGER_KEY_PREFIX}{job_id}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerSchedule {
    Cron { expression: String },
    Once { fire_at: DateTime<Utc> },
}

impl TriggerSchedule {
    pub const fn is_one_shot(&self) -> bool {
        matches!(self, Self::Once { .. })
    }
}

/// One registered trigger. At most one exists per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub key: String,
    pub job_id: Uuid,
    pub schedule: TriggerSchedule,
    pub next_fire_at: DateTime<Utc>,
}

impl Trigger {
    pub fn new(job_id: Uuid, schedule: TriggerSchedule, next_fire_at: DateTime<Utc>) -> Self {
        Self { key: trigger_key(job_id), job_id, schedule, next_fire_at }
    }
}

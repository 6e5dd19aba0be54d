//! Persistent trigger store
//!
//! One row per job in `scheduler_triggers`, keyed deterministically by job
//! id, plus the single-row `scheduler_state` holding the paused flag.

use std::sync::Arc;

use arkive_common::storage::{SqliteConnection, StorageError, StorageResult};
use arkive_domain::{Result, Trigger, TriggerSchedule};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::columns::{bool_to_int, from_millis, opt_from_millis, parse_uuid, to_millis};
use super::manager::DbManager;
use super::with_connection;

const KIND_CRON: &str = "cron";
const KIND_ONCE: &str = "once";

pub struct SqliteTriggerRepository {
    db: Arc<DbManager>,
}

impl SqliteTriggerRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert or replace the trigger for `trigger.job_id`.
    pub async fn upsert(&self, trigger: &Trigger) -> Result<()> {
        let trigger = trigger.clone();
        with_connection(&self.db, move |conn| upsert_trigger(conn, &trigger)).await
    }

    pub async fn get(&self, job_id: Uuid) -> Result<Option<Trigger>> {
        with_connection(&self.db, move |conn| query_trigger(conn, job_id)).await
    }

    /// True when a trigger existed.
    pub async fn remove(&self, job_id: Uuid) -> Result<bool> {
        with_connection(&self.db, move |conn| {
            let removed = conn.execute(
                "DELETE FROM scheduler_triggers WHERE job_id = ?1",
                params![job_id.to_string()],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    pub async fn list(&self) -> Result<Vec<Trigger>> {
        with_connection(&self.db, |conn| {
            let mut stmt = conn.prepare(&format!("{TRIGGER_SELECT} ORDER BY next_fire_at"))?;
            stmt.query_map(&[], map_trigger_row)
        })
        .await
    }

    /// Triggers whose next fire instant is at or before `now`, earliest first.
    pub async fn due(&self, now: DateTime<Utc>) -> Result<Vec<Trigger>> {
        with_connection(&self.db, move |conn| {
            let mut stmt =
                conn.prepare(&format!("{TRIGGER_SELECT} WHERE next_fire_at <= ?1 ORDER BY next_fire_at"))?;
            stmt.query_map(params![to_millis(now)], map_trigger_row)
        })
        .await
    }

    /// Move a trigger to its next fire instant. False when it no longer
    /// exists.
    pub async fn set_next_fire(&self, job_id: Uuid, next_fire_at: DateTime<Utc>) -> Result<bool> {
        with_connection(&self.db, move |conn| {
            let updated = conn.execute(
                "UPDATE scheduler_triggers SET next_fire_at = ?2 WHERE job_id = ?1",
                params![job_id.to_string(), to_millis(next_fire_at)],
            )?;
            Ok(updated > 0)
        })
        .await
    }

    pub async fn is_paused(&self) -> Result<bool> {
        with_connection(&self.db, |conn| {
            match conn.query_row("SELECT paused FROM scheduler_state WHERE id = 1", &[], |row| {
                row.get::<_, i64>(0)
            }) {
                Ok(paused) => Ok(paused != 0),
                Err(StorageError::Rusqlite(rusqlite::Error::QueryReturnedNoRows)) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
    }

    pub async fn set_paused(&self, paused: bool) -> Result<()> {
        with_connection(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO scheduler_state (id, paused) VALUES (1, ?1)
                 ON CONFLICT(id) DO UPDATE SET paused = excluded.paused",
                params![bool_to_int(paused)],
            )?;
            Ok(())
        })
        .await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

const TRIGGER_SELECT: &str =
    "SELECT key, job_id, schedule_kind, cron_expression, fire_at, next_fire_at FROM scheduler_triggers";

fn query_trigger(conn: &SqliteConnection, job_id: Uuid) -> StorageResult<Option<Trigger>> {
    match conn.query_row(
        &format!("{TRIGGER_SELECT} WHERE job_id = ?1"),
        params![job_id.to_string()],
        map_trigger_row,
    ) {
        Ok(trigger) => Ok(Some(trigger)),
        Err(StorageError::Rusqlite(rusqlite::Error::QueryReturnedNoRows)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn upsert_trigger(conn: &SqliteConnection, trigger: &Trigger) -> StorageResult<()> {
    let (kind, expression, fire_at) = match &trigger.schedule {
        TriggerSchedule::Cron { expression } => (KIND_CRON, Some(expression.as_str()), None),
        TriggerSchedule::Once { fire_at } => (KIND_ONCE, None, Some(to_millis(*fire_at))),
    };

    conn.execute(
        "INSERT INTO scheduler_triggers (key, job_id, schedule_kind, cron_expression, fire_at, next_fire_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(key) DO UPDATE SET
            schedule_kind = excluded.schedule_kind,
            cron_expression = excluded.cron_expression,
            fire_at = excluded.fire_at,
            next_fire_at = excluded.next_fire_at",
        params![
            trigger.key,
            trigger.job_id.to_string(),
            kind,
            expression,
            fire_at,
            to_millis(trigger.next_fire_at),
        ],
    )?;
    Ok(())
}

fn map_trigger_row(row: &Row<'_>) -> rusqlite::Result<Trigger> {
    let kind: String = row.get(2)?;
    let schedule = if kind == KIND_ONCE {
        let fire_at = opt_from_millis(4, row.get(4)?)?.ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Null,
                "one-shot trigger without fire instant".into(),
            )
        })?;
        TriggerSchedule::Once { fire_at }
    } else {
        TriggerSchedule::Cron { expression: row.get::<_, Option<String>>(3)?.unwrap_or_default() }
    };

    Ok(Trigger {
        key: row.get(0)?,
        job_id: parse_uuid(1, &row.get::<_, String>(1)?)?,
        schedule,
        next_fire_at: from_millis(5, row.get(5)?)?,
    })
}

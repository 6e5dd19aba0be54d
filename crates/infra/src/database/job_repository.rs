//! SQLite-backed implementation of the `JobRepository` port.
//!
//! Jobs, their sync options and their scoped exclusion patterns are written
//! together in one transaction. Soft-deleted rows stay in `jobs`; only
//! `list_active_jobs` and `name_exists` filter them out.

use std::sync::Arc;

use arkive_common::storage::StorageResult;
use arkive_core::JobRepository;
use arkive_domain::{ExclusionPattern, Job, Result, SyncOptions};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::debug;
use uuid::Uuid;

use super::columns::{
    bool_to_int, from_millis, opt_bool_to_int, opt_from_millis, opt_to_millis, parse_token,
    parse_uuid, to_millis,
};
use super::manager::DbManager;
use super::with_connection;

/// SQLite-backed repository for jobs and exclusion patterns.
pub struct SqliteJobRepository {
    db: Arc<DbManager>,
}

impl SqliteJobRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        with_connection(&self.db, move |conn| query_job(conn, id)).await
    }

    async fn list_active_jobs(&self) -> Result<Vec<Job>> {
        with_connection(&self.db, |conn| query_active_jobs(conn)).await
    }

    async fn insert_job(&self, job: &Job) -> Result<()> {
        let job = job.clone();
        with_connection(&self.db, move |conn| {
            let tx = conn.transaction()?;
            insert_job_row(&tx, &job)?;
            write_options(&tx, &job)?;
            write_pattern_links(&tx, &job)?;
            tx.commit()?;
            debug!(job_id = %job.id, "job_repository.inserted");
            Ok(())
        })
        .await
    }

    async fn update_job(&self, job: &Job) -> Result<()> {
        let job = job.clone();
        with_connection(&self.db, move |conn| {
            let tx = conn.transaction()?;
            update_job_row(&tx, &job)?;
            write_options(&tx, &job)?;
            tx.execute(
                "DELETE FROM job_exclusion_patterns WHERE job_id = ?1",
                params![job.id.to_string()],
            )?;
            write_pattern_links(&tx, &job)?;
            tx.commit()?;
            debug!(job_id = %job.id, "job_repository.updated");
            Ok(())
        })
        .await
    }

    async fn name_exists(&self, name: &str, excluding: Option<Uuid>) -> Result<bool> {
        let needle = name.trim().to_lowercase();
        with_connection(&self.db, move |conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM jobs WHERE deleted_at IS NULL")?;
            let rows = stmt.query_map(&[], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            let excluded = excluding.map(|id| id.to_string());
            // compared in Rust: SQLite lower() only folds ASCII
            Ok(rows.iter().any(|(id, existing)| {
                Some(id) != excluded.as_ref() && existing.trim().to_lowercase() == needle
            }))
        })
        .await
    }

    async fn set_enabled(&self, id: Uuid, enabled: bool, modified_at: DateTime<Utc>) -> Result<bool> {
        with_connection(&self.db, move |conn| {
            let changed = conn.execute(
                "UPDATE jobs SET enabled = ?2, modified_at = ?3 WHERE id = ?1 AND deleted_at IS NULL",
                params![id.to_string(), bool_to_int(enabled), to_millis(modified_at)],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn soft_delete(&self, id: Uuid, deleted_at: DateTime<Utc>) -> Result<bool> {
        with_connection(&self.db, move |conn| {
            let at = to_millis(deleted_at);
            let changed = conn.execute(
                "UPDATE jobs SET deleted_at = ?2, modified_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
                params![id.to_string(), at],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn mark_last_run(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        with_connection(&self.db, move |conn| {
            conn.execute(
                "UPDATE jobs SET last_run_at = ?2 WHERE id = ?1",
                params![id.to_string(), to_millis(at)],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_exclusion_patterns(&self) -> Result<Vec<ExclusionPattern>> {
        with_connection(&self.db, |conn| {
            query_patterns(conn, "SELECT id, name, pattern, is_global FROM exclusion_patterns ORDER BY name", None)
        })
        .await
    }

    async fn save_exclusion_pattern(&self, pattern: &ExclusionPattern) -> Result<()> {
        let pattern = pattern.clone();
        with_connection(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO exclusion_patterns (id, name, pattern, is_global)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    pattern = excluded.pattern,
                    is_global = excluded.is_global",
                params![
                    pattern.id.to_string(),
                    pattern.name,
                    pattern.pattern,
                    bool_to_int(pattern.is_global)
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_exclusion_pattern(&self, id: Uuid) -> Result<bool> {
        with_connection(&self.db, move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM job_exclusion_patterns WHERE pattern_id = ?1",
                params![id.to_string()],
            )?;
            let removed =
                tx.execute("DELETE FROM exclusion_patterns WHERE id = ?1", params![id.to_string()])?;
            tx.commit()?;
            Ok(removed > 0)
        })
        .await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

const JOB_SELECT: &str = "SELECT j.id, j.name, j.description, j.source_path, j.destination_path,
        j.enabled, j.sync_mode, j.comparison_method, j.overwrite_behavior, j.trigger_type,
        j.cron_expression, j.one_time_at, j.notify_on_start, j.notify_on_complete,
        j.notify_on_fail, j.created_at, j.modified_at, j.deleted_at, j.last_run_at,
        o.recursive, o.delete_orphaned, o.skip_hidden_and_system, o.verify_after_copy
    FROM jobs j
    LEFT JOIN sync_options o ON o.job_id = j.id";

fn query_job(conn: &Connection, id: Uuid) -> StorageResult<Option<Job>> {
    let sql = format!("{JOB_SELECT} WHERE j.id = ?1");
    let job = match conn.query_row(&sql, params![id.to_string()], map_job_row) {
        Ok(job) => job,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    Ok(Some(with_patterns(conn, job)?))
}

fn query_active_jobs(conn: &Connection) -> StorageResult<Vec<Job>> {
    let sql = format!("{JOB_SELECT} WHERE j.deleted_at IS NULL ORDER BY j.name");
    let mut stmt = conn.prepare(&sql)?;
    let jobs = stmt.query_map([], map_job_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
    jobs.into_iter().map(|job| with_patterns(conn, job)).collect()
}

/// Attach scoped patterns followed by every global pattern.
fn with_patterns(conn: &Connection, mut job: Job) -> StorageResult<Job> {
    let mut patterns = query_patterns(
        conn,
        "SELECT p.id, p.name, p.pattern, p.is_global
         FROM exclusion_patterns p
         JOIN job_exclusion_patterns jp ON jp.pattern_id = p.id
         WHERE jp.job_id = ?1 AND p.is_global = 0
         ORDER BY p.name",
        Some(job.id),
    )?;
    patterns.extend(query_patterns(
        conn,
        "SELECT id, name, pattern, is_global FROM exclusion_patterns WHERE is_global = 1 ORDER BY name",
        None,
    )?);
    job.exclusion_patterns = patterns;
    Ok(job)
}

fn query_patterns(conn: &Connection, sql: &str, job_id: Option<Uuid>) -> StorageResult<Vec<ExclusionPattern>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = match job_id {
        Some(id) => stmt.query_map(params![id.to_string()], map_pattern_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
        None => stmt.query_map([], map_pattern_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
    };
    Ok(rows)
}

fn map_pattern_row(row: &Row<'_>) -> rusqlite::Result<ExclusionPattern> {
    Ok(ExclusionPattern {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        pattern: row.get(2)?,
        is_global: row.get::<_, i64>(3)? != 0,
    })
}

fn map_job_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    let sync_options = match row.get::<_, Option<i64>>(19)? {
        Some(recursive) => Some(SyncOptions {
            recursive: recursive != 0,
            delete_orphaned: row.get::<_, i64>(20)? != 0,
            skip_hidden_and_system: row.get::<_, i64>(21)? != 0,
            verify_after_copy: row.get::<_, i64>(22)? != 0,
        }),
        None => None,
    };

    Ok(Job {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        description: row.get(2)?,
        source_path: row.get(3)?,
        destination_path: row.get(4)?,
        enabled: row.get::<_, i64>(5)? != 0,
        sync_mode: parse_token(6, &row.get::<_, String>(6)?)?,
        comparison_method: parse_token(7, &row.get::<_, String>(7)?)?,
        overwrite_behavior: parse_token(8, &row.get::<_, String>(8)?)?,
        trigger_type: parse_token(9, &row.get::<_, String>(9)?)?,
        cron_expression: row.get(10)?,
        one_time_at: opt_from_millis(11, row.get(11)?)?,
        notify_on_start: row.get::<_, Option<i64>>(12)?.map(|v| v != 0),
        notify_on_complete: row.get::<_, Option<i64>>(13)?.map(|v| v != 0),
        notify_on_fail: row.get::<_, Option<i64>>(14)?.map(|v| v != 0),
        sync_options,
        exclusion_patterns: Vec::new(),
        created_at: from_millis(15, row.get(15)?)?,
        modified_at: from_millis(16, row.get(16)?)?,
        deleted_at: opt_from_millis(17, row.get(17)?)?,
        last_run_at: opt_from_millis(18, row.get(18)?)?,
    })
}

fn insert_job_row(conn: &Connection, job: &Job) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO jobs (
            id, name, description, source_path, destination_path, enabled, sync_mode,
            comparison_method, overwrite_behavior, trigger_type, cron_expression, one_time_at,
            notify_on_start, notify_on_complete, notify_on_fail, created_at, modified_at,
            deleted_at, last_run_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            job.id.to_string(),
            job.name,
            job.description,
            job.source_path,
            job.destination_path,
            bool_to_int(job.enabled),
            job.sync_mode.as_str(),
            job.comparison_method.as_str(),
            job.overwrite_behavior.as_str(),
            job.trigger_type.as_str(),
            job.cron_expression,
            opt_to_millis(job.one_time_at),
            opt_bool_to_int(job.notify_on_start),
            opt_bool_to_int(job.notify_on_complete),
            opt_bool_to_int(job.notify_on_fail),
            to_millis(job.created_at),
            to_millis(job.modified_at),
            opt_to_millis(job.deleted_at),
            opt_to_millis(job.last_run_at),
        ],
    )?;
    Ok(())
}

fn update_job_row(conn: &Connection, job: &Job) -> StorageResult<()> {
    conn.execute(
        "UPDATE jobs SET
            name = ?2, description = ?3, source_path = ?4, destination_path = ?5, enabled = ?6,
            sync_mode = ?7, comparison_method = ?8, overwrite_behavior = ?9, trigger_type = ?10,
            cron_expression = ?11, one_time_at = ?12, notify_on_start = ?13,
            notify_on_complete = ?14, notify_on_fail = ?15, modified_at = ?16
         WHERE id = ?1",
        params![
            job.id.to_string(),
            job.name,
            job.description,
            job.source_path,
            job.destination_path,
            bool_to_int(job.enabled),
            job.sync_mode.as_str(),
            job.comparison_method.as_str(),
            job.overwrite_behavior.as_str(),
            job.trigger_type.as_str(),
            job.cron_expression,
            opt_to_millis(job.one_time_at),
            opt_bool_to_int(job.notify_on_start),
            opt_bool_to_int(job.notify_on_complete),
            opt_bool_to_int(job.notify_on_fail),
            to_millis(job.modified_at),
        ],
    )?;
    Ok(())
}

fn write_options(conn: &Connection, job: &Job) -> StorageResult<()> {
    let Some(options) = job.sync_options else {
        return Ok(());
    };
    conn.execute(
        "INSERT INTO sync_options (job_id, recursive, delete_orphaned, skip_hidden_and_system, verify_after_copy)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(job_id) DO UPDATE SET
            recursive = excluded.recursive,
            delete_orphaned = excluded.delete_orphaned,
            skip_hidden_and_system = excluded.skip_hidden_and_system,
            verify_after_copy = excluded.verify_after_copy",
        params![
            job.id.to_string(),
            bool_to_int(options.recursive),
            bool_to_int(options.delete_orphaned),
            bool_to_int(options.skip_hidden_and_system),
            bool_to_int(options.verify_after_copy),
        ],
    )?;
    Ok(())
}

/// Global patterns apply to every job and are never linked.
fn write_pattern_links(conn: &Connection, job: &Job) -> StorageResult<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO job_exclusion_patterns (job_id, pattern_id) VALUES (?1, ?2)",
    )?;
    for pattern in job.exclusion_patterns.iter().filter(|p| !p.is_global) {
        stmt.execute(params![job.id.to_string(), pattern.id.to_string()])?;
    }
    Ok(())
}

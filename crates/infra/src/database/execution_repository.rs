//! SQLite-backed implementation of the `ExecutionRepository` port.
//!
//! The terminal update of an execution and its log rows are written in a
//! single transaction so a run is never visible half-persisted.

use std::sync::Arc;

use arkive_common::storage::{SqliteConnection, StorageError, StorageResult};
use arkive_core::ExecutionRepository;
use arkive_domain::{Execution, ExecutionLog, Result, SyncCounters};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::debug;
use uuid::Uuid;

use super::columns::{
    from_millis, int_to_u32, int_to_u64, opt_from_millis, opt_to_millis, parse_token, parse_uuid,
    to_millis, u64_to_int,
};
use super::manager::DbManager;
use super::with_connection;

pub struct SqliteExecutionRepository {
    db: Arc<DbManager>,
}

impl SqliteExecutionRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ExecutionRepository for SqliteExecutionRepository {
    async fn insert_execution(&self, execution: &Execution) -> Result<()> {
        let execution = execution.clone();
        with_connection(&self.db, move |conn| upsert_execution(conn, &execution)).await
    }

    async fn complete_execution(&self, execution: &Execution, logs: &[ExecutionLog]) -> Result<()> {
        let execution = execution.clone();
        let logs = logs.to_vec();
        with_connection(&self.db, move |conn| {
            let tx = conn.transaction()?;
            upsert_execution(&tx, &execution)?;
            insert_logs(&tx, &logs)?;
            tx.commit()?;
            debug!(execution_id = %execution.id, logs = logs.len(), "execution_repository.completed");
            Ok(())
        })
        .await
    }

    async fn get_execution(&self, id: Uuid) -> Result<Option<Execution>> {
        with_connection(&self.db, move |conn| query_execution(conn, id)).await
    }

    async fn list_executions(&self, job_id: Uuid, limit: u32) -> Result<Vec<Execution>> {
        with_connection(&self.db, move |conn| query_executions(conn, job_id, limit)).await
    }

    async fn list_logs(&self, execution_id: Uuid) -> Result<Vec<ExecutionLog>> {
        with_connection(&self.db, move |conn| query_logs(conn, execution_id, false)).await
    }

    async fn list_issue_logs(&self, execution_id: Uuid) -> Result<Vec<ExecutionLog>> {
        with_connection(&self.db, move |conn| query_logs(conn, execution_id, true)).await
    }

    async fn delete_logs_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        with_connection(&self.db, move |conn| {
            let removed = conn.execute(
                "DELETE FROM execution_logs WHERE timestamp < ?1",
                params![to_millis(cutoff)],
            )?;
            Ok(removed as u64)
        })
        .await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

const EXECUTION_SELECT: &str = "SELECT id, job_id, status, started_at, ended_at, duration_ms,
        files_scanned, files_copied, files_updated, files_deleted, files_skipped, files_failed,
        bytes_transferred, error_count, warning_count
    FROM executions";

fn query_execution(conn: &SqliteConnection, id: Uuid) -> StorageResult<Option<Execution>> {
    let sql = format!("{EXECUTION_SELECT} WHERE id = ?1");
    match conn.query_row(&sql, params![id.to_string()], map_execution_row) {
        Ok(execution) => Ok(Some(execution)),
        Err(StorageError::Rusqlite(rusqlite::Error::QueryReturnedNoRows)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn query_executions(conn: &SqliteConnection, job_id: Uuid, limit: u32) -> StorageResult<Vec<Execution>> {
    let sql = format!("{EXECUTION_SELECT} WHERE job_id = ?1 ORDER BY started_at DESC LIMIT ?2");
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_map(params![job_id.to_string(), i64::from(limit)], map_execution_row)
}

fn upsert_execution(conn: &Connection, execution: &Execution) -> StorageResult<()> {
    let c = &execution.counters;
    conn.execute(
        "INSERT INTO executions (
            id, job_id, status, started_at, ended_at, duration_ms, files_scanned, files_copied,
            files_updated, files_deleted, files_skipped, files_failed, bytes_transferred,
            error_count, warning_count
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        ON CONFLICT(id) DO UPDATE SET
            status = excluded.status,
            ended_at = excluded.ended_at,
            duration_ms = excluded.duration_ms,
            files_scanned = excluded.files_scanned,
            files_copied = excluded.files_copied,
            files_updated = excluded.files_updated,
            files_deleted = excluded.files_deleted,
            files_skipped = excluded.files_skipped,
            files_failed = excluded.files_failed,
            bytes_transferred = excluded.bytes_transferred,
            error_count = excluded.error_count,
            warning_count = excluded.warning_count",
        params![
            execution.id.to_string(),
            execution.job_id.to_string(),
            execution.status.as_str(),
            to_millis(execution.started_at),
            opt_to_millis(execution.ended_at),
            execution.duration_ms,
            c.files_scanned,
            c.files_copied,
            c.files_updated,
            c.files_deleted,
            c.files_skipped,
            c.files_failed,
            u64_to_int(c.bytes_transferred),
            c.error_count,
            c.warning_count,
        ],
    )?;
    Ok(())
}

fn insert_logs(conn: &Connection, logs: &[ExecutionLog]) -> StorageResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO execution_logs (
            id, execution_id, timestamp, level, message, file_path, operation, exception
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for log in logs {
        stmt.execute(params![
            log.id.to_string(),
            log.execution_id.to_string(),
            to_millis(log.timestamp),
            log.level.as_str(),
            log.message,
            log.file_path,
            log.operation.map(|op| op.as_str()),
            log.exception,
        ])?;
    }
    Ok(())
}

fn query_logs(conn: &Connection, execution_id: Uuid, issues_only: bool) -> StorageResult<Vec<ExecutionLog>> {
    let filter = if issues_only { "AND level IN ('error', 'warning')" } else { "" };
    let sql = format!(
        "SELECT id, execution_id, timestamp, level, message, file_path, operation, exception
         FROM execution_logs
         WHERE execution_id = ?1 {filter}
         ORDER BY timestamp, rowid"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![execution_id.to_string()], map_log_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn map_execution_row(row: &Row<'_>) -> rusqlite::Result<Execution> {
    Ok(Execution {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        job_id: parse_uuid(1, &row.get::<_, String>(1)?)?,
        status: parse_token(2, &row.get::<_, String>(2)?)?,
        started_at: from_millis(3, row.get(3)?)?,
        ended_at: opt_from_millis(4, row.get(4)?)?,
        duration_ms: row.get(5)?,
        counters: SyncCounters {
            files_scanned: int_to_u32(row.get(6)?),
            files_copied: int_to_u32(row.get(7)?),
            files_updated: int_to_u32(row.get(8)?),
            files_deleted: int_to_u32(row.get(9)?),
            files_skipped: int_to_u32(row.get(10)?),
            files_failed: int_to_u32(row.get(11)?),
            bytes_transferred: int_to_u64(row.get(12)?),
            error_count: int_to_u32(row.get(13)?),
            warning_count: int_to_u32(row.get(14)?),
        },
    })
}

fn map_log_row(row: &Row<'_>) -> rusqlite::Result<ExecutionLog> {
    let operation = match row.get::<_, Option<String>>(6)? {
        Some(token) => Some(parse_token(6, &token)?),
        None => None,
    };

    Ok(ExecutionLog {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        execution_id: parse_uuid(1, &row.get::<_, String>(1)?)?,
        timestamp: from_millis(2, row.get(2)?)?,
        level: parse_token(3, &row.get::<_, String>(3)?)?,
        message: row.get(4)?,
        file_path: row.get(5)?,
        operation,
        exception: row.get(7)?,
    })
}

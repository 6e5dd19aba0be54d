//! SQLite-backed store for process-wide log events.

use std::sync::Arc;

use arkive_common::storage::{SqliteConnection, StorageResult};
use arkive_core::ApplicationLogRepository;
use arkive_domain::{ApplicationLog, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use super::columns::{from_millis, parse_token, to_millis};
use super::manager::DbManager;
use super::with_connection;

pub struct SqliteApplicationLogRepository {
    db: Arc<DbManager>,
}

impl SqliteApplicationLogRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ApplicationLogRepository for SqliteApplicationLogRepository {
    async fn append_application_logs(&self, logs: &[ApplicationLog]) -> Result<()> {
        if logs.is_empty() {
            return Ok(());
        }
        let logs = logs.to_vec();
        with_connection(&self.db, move |conn| insert_logs(conn, &logs)).await
    }

    async fn list_application_logs(&self, limit: u32) -> Result<Vec<ApplicationLog>> {
        with_connection(&self.db, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, level, message, exception, source_context
                 FROM application_logs
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?1",
            )?;
            stmt.query_map(params![i64::from(limit)], map_log_row)
        })
        .await
    }

    async fn delete_application_logs_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        with_connection(&self.db, move |conn| {
            let removed = conn.execute(
                "DELETE FROM application_logs WHERE timestamp < ?1",
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

fn insert_logs(conn: &mut SqliteConnection, logs: &[ApplicationLog]) -> StorageResult<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO application_logs (timestamp, level, message, exception, source_context)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for log in logs {
            stmt.execute(params![
                to_millis(log.timestamp),
                log.level.as_str(),
                log.message,
                log.exception,
                log.source_context,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn map_log_row(row: &Row<'_>) -> rusqlite::Result<ApplicationLog> {
    Ok(ApplicationLog {
        id: row.get(0)?,
        timestamp: from_millis(1, row.get(1)?)?,
        level: parse_token(2, &row.get::<_, String>(2)?)?,
        message: row.get(3)?,
        exception: row.get(4)?,
        source_context: row.get(5)?,
    })
}

//! SQLite-backed key/value settings store.

use std::sync::Arc;

use arkive_common::storage::{SqliteConnection, StorageError, StorageResult};
use arkive_core::SettingsRepository;
use arkive_domain::Result;
use async_trait::async_trait;
use rusqlite::params;

use super::manager::DbManager;
use super::with_connection;

pub struct SqliteSettingsRepository {
    db: Arc<DbManager>,
}

impl SqliteSettingsRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepository {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        with_connection(&self.db, move |conn| query_setting(conn, &key)).await
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        with_connection(&self.db, move |conn| upsert_setting(conn, &key, &value)).await
    }

    async fn set_settings(&self, values: Vec<(String, String)>) -> Result<()> {
        with_connection(&self.db, move |conn| {
            let tx = conn.transaction()?;
            for (key, value) in &values {
                tx.execute(UPSERT_SQL, params![key, value])?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn list_settings(&self) -> Result<Vec<(String, String)>> {
        with_connection(&self.db, |conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM app_settings ORDER BY key")?;
            stmt.query_map(&[], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        })
        .await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

const UPSERT_SQL: &str = "INSERT INTO app_settings (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value";

fn query_setting(conn: &SqliteConnection, key: &str) -> StorageResult<Option<String>> {
    match conn.query_row("SELECT value FROM app_settings WHERE key = ?1", params![key], |row| {
        row.get::<_, String>(0)
    }) {
        Ok(value) => Ok(Some(value)),
        Err(StorageError::Rusqlite(rusqlite::Error::QueryReturnedNoRows)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn upsert_setting(conn: &SqliteConnection, key: &str, value: &str) -> StorageResult<()> {
    conn.execute(UPSERT_SQL, params![key, value])?;
    Ok(())
}

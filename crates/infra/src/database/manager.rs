//! Database connection manager backed by the shared SQLite pool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use arkive_common::storage::{PoolHealth, SqliteConnection, SqlitePool, SqlitePoolConfig};
use arkive_domain::{ArkiveError, DatabaseConfig, Result};
use chrono::Utc;
use rusqlite::params;
use tracing::info;

use crate::errors::{map_storage_error, InfraError};

const SCHEMA_VERSION: i32 = 2;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps an [`SqlitePool`].
pub struct DbManager {
    pool: SqlitePool,
    path: PathBuf,
}

impl DbManager {
    /// Create a new manager with the given pool size and busy timeout.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32, busy_timeout: Duration) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let config = SqlitePoolConfig::default()
            .with_max_size(pool_size.max(1))
            .with_busy_timeout(busy_timeout);

        let pool = SqlitePool::new(&path, config).map_err(map_storage_error)?;

        info!(
            db_path = %path.display(),
            max_connections = pool.config().max_size,
            "database.pool_initialised"
        );

        Ok(Self { pool, path })
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::new(&config.path, config.pool_size, Duration::from_millis(config.busy_timeout_ms))
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> Result<SqliteConnection> {
        self.pool.get_connection().map_err(map_storage_error)
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        create_schema(&conn)?;
        info!(version = SCHEMA_VERSION, "database.migrations_applied");
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify connectivity by running a trivial query on a pooled connection.
    pub fn health_check(&self) -> Result<PoolHealth> {
        let health = self.pool.health_check();
        if health.healthy {
            Ok(health)
        } else {
            Err(ArkiveError::Database(
                health.message.unwrap_or_else(|| "database unhealthy".to_string()),
            ))
        }
    }
}

fn create_schema(conn: &SqliteConnection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, ?2)",
        params![SCHEMA_VERSION, Utc::now().timestamp_millis()],
    )
    .map_err(map_storage_error)?;
    Ok(())
}

fn map_sql_error(err: rusqlite::Error) -> ArkiveError {
    ArkiveError::from(InfraError::from(err))
}

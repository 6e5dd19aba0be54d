//! SQLite connection pool
//!
//! Provides r2d2-based connection pooling for SQLite databases.

use std::path::{Path, PathBuf};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, info, instrument, warn};

use super::config::SqlitePoolConfig;
use super::connection::SqliteConnection;
use super::pragmas::apply_connection_pragmas;
use crate::storage::error::{StorageError, StorageResult};

/// Snapshot of pool health
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolHealth {
    pub healthy: bool,
    pub connections: u32,
    pub idle_connections: u32,
    pub max_connections: u32,
    pub message: Option<String>,
}

/// SQLite connection pool
///
/// Every connection gets the configured pragmas applied when it is opened.
#[derive(Debug)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
    config: SqlitePoolConfig,
}

impl SqlitePool {
    /// Create a new connection pool
    ///
    /// # Process
    /// 1. Create connection manager with a pragma init callback
    /// 2. Build r2d2 pool with configured size and timeouts
    /// 3. Test a connection so bad paths fail here instead of on first use
    #[instrument(fields(db_path = ?path, pool_size = config.max_size))]
    pub fn new(path: &Path, config: SqlitePoolConfig) -> StorageResult<Self> {
        config.validate()?;
        info!("Creating SQLite connection pool");

        let pool_config = config.clone();
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            apply_connection_pragmas(conn, &pool_config)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        });

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| {
                warn!("Failed to create connection pool: {}", e);
                StorageError::Connection(format!("Failed to create pool: {e}"))
            })?;

        {
            let _conn = pool.get().map_err(|e| {
                warn!("Failed to get test connection: {}", e);
                StorageError::Connection(format!("Failed to get test connection: {e}"))
            })?;
            debug!("Test connection acquired");
        }

        info!("SQLite pool created with {} connections", config.max_size);

        Ok(Self { pool, path: path.to_path_buf(), config })
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> StorageResult<SqliteConnection> {
        let start = std::time::Instant::now();

        match self.pool.get() {
            Ok(conn) => {
                debug!(elapsed_ms = start.elapsed().as_millis() as u64, "storage.connection_acquired");
                Ok(SqliteConnection::new(conn))
            }
            Err(e) => {
                let err_str = e.to_string().to_lowercase();
                if err_str.contains("timed out") || err_str.contains("timeout") {
                    warn!("Connection timeout after {:?}", self.config.connection_timeout);
                    Err(StorageError::Timeout(self.config.connection_timeout.as_secs()))
                } else {
                    warn!("Connection error: {}", e);
                    Err(StorageError::Connection(format!("Failed to get connection: {e}")))
                }
            }
        }
    }

    pub fn health_check(&self) -> PoolHealth {
        let state = self.pool.state();
        let probe = self
            .pool
            .get()
            .map_err(StorageError::from)
            .and_then(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).map_err(StorageError::from));

        PoolHealth {
            healthy: probe.is_ok(),
            connections: state.connections,
            idle_connections: state.idle_connections,
            max_connections: self.config.max_size,
            message: probe.err().map(|e| format!("Pool unhealthy: {e}")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &SqlitePoolConfig {
        &self.config
    }
}

//! Pooled connection wrapper

use std::ops::{Deref, DerefMut};

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection as RusqliteConnection, Row, Statement as RusqliteStatement, ToSql};
use tracing::instrument;

use crate::storage::error::{StorageError, StorageResult};

/// Pooled SQLite connection.
///
/// The connection is returned to the pool when dropped. Derefs to
/// [`rusqlite::Connection`] for anything the wrapper does not cover.
pub struct SqliteConnection {
    inner: PooledConnection<SqliteConnectionManager>,
}

impl SqliteConnection {
    pub fn new(conn: PooledConnection<SqliteConnectionManager>) -> Self {
        Self { inner: conn }
    }

    pub fn inner(&self) -> &RusqliteConnection {
        &self.inner
    }

    /// Execute a statement that returns no rows.
    #[instrument(skip(self, params), fields(sql = %sql))]
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> StorageResult<usize> {
        self.inner.execute(sql, params).map_err(StorageError::from)
    }

    /// Execute a SQL query that returns a single row
    #[instrument(skip(self, params, f), fields(sql = %sql))]
    pub fn query_row<T, F>(&self, sql: &str, params: &[&dyn ToSql], f: F) -> StorageResult<T>
    where
        F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
    {
        self.inner.query_row(sql, params, f).map_err(StorageError::from)
    }

    #[instrument(skip(self), fields(sql = %sql))]
    pub fn prepare(&self, sql: &str) -> StorageResult<SqliteStatement<'_>> {
        let stmt = self.inner.prepare(sql).map_err(StorageError::from)?;
        Ok(SqliteStatement::new(stmt))
    }

    /// Begin a transaction. Rolls back on drop unless committed.
    pub fn transaction(&mut self) -> StorageResult<rusqlite::Transaction<'_>> {
        self.inner.transaction().map_err(StorageError::from)
    }
}

impl Deref for SqliteConnection {
    type Target = RusqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for SqliteConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// Prepared statement wrapper
pub struct SqliteStatement<'conn> {
    inner: RusqliteStatement<'conn>,
}

impl<'conn> SqliteStatement<'conn> {
    pub fn new(stmt: RusqliteStatement<'conn>) -> Self {
        Self { inner: stmt }
    }

    pub fn execute(&mut self, params: &[&dyn ToSql]) -> StorageResult<usize> {
        self.inner.execute(params).map_err(StorageError::from)
    }

    /// Query with the statement and collect the mapped rows
    pub fn query_map<T, F>(&mut self, params: &[&dyn ToSql], mut f: F) -> StorageResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
    {
        let rows = self.inner.query_map(params, |row| f(row)).map_err(StorageError::from)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::storage::{SqlitePool, SqlitePoolConfig};

    fn open_pool(temp_dir: &TempDir) -> SqlitePool {
        SqlitePool::new(&temp_dir.path().join("test.db"), SqlitePoolConfig::default())
            .expect("pool")
    }

    #[test]
    fn test_connection_execute_and_query_row() {
        let temp_dir = TempDir::new().expect("temp dir");
        let pool = open_pool(&temp_dir);
        let conn = pool.get_connection().expect("connection");

        conn.execute("CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)", &[])
            .expect("create table");
        let inserted = conn.execute("INSERT INTO test (name) VALUES (?)", &[&"Bob"]).expect("insert");
        assert_eq!(inserted, 1);

        let name: String = conn
            .query_row("SELECT name FROM test WHERE id = ?", &[&1], |row| row.get(0))
            .expect("query row");
        assert_eq!(name, "Bob");
    }

    #[test]
    fn test_prepared_statement_query_map() {
        let temp_dir = TempDir::new().expect("temp dir");
        let pool = open_pool(&temp_dir);
        let conn = pool.get_connection().expect("connection");

        conn.execute("CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)", &[])
            .expect("create table");
        {
            let mut insert = conn.prepare("INSERT INTO test (name) VALUES (?)").expect("prepare");
            insert.execute(&[&"Charlie"]).expect("insert");
            insert.execute(&[&"Diana"]).expect("insert");
        }

        let mut select = conn.prepare("SELECT name FROM test ORDER BY id").expect("prepare");
        let names: Vec<String> = select.query_map(&[], |row| row.get(0)).expect("query map");
        assert_eq!(names, vec!["Charlie".to_string(), "Diana".to_string()]);
    }

    #[test]
    fn test_transaction_rolls_back_on_drop() {
        let temp_dir = TempDir::new().expect("temp dir");
        let pool = open_pool(&temp_dir);
        let mut conn = pool.get_connection().expect("connection");

        conn.execute("CREATE TABLE test (id INTEGER PRIMARY KEY)", &[]).expect("create table");
        {
            let tx = conn.transaction().expect("begin");
            tx.execute("INSERT INTO test (id) VALUES (1)", []).expect("insert");
        }

        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM test", &[], |row| row.get(0)).expect("count");
        assert_eq!(count, 0);
    }
}

//! SQLite storage primitives
//!
//! r2d2-backed connection pooling with per-connection pragmas and a
//! classified storage error type. Schema management is left to callers.

pub mod config;
pub mod connection;
pub mod error;
pub mod pool;
pub mod pragmas;

pub use config::SqlitePoolConfig;
pub use connection::{SqliteConnection, SqliteStatement};
pub use error::{StorageError, StorageResult};
pub use pool::{PoolHealth, SqlitePool};
pub use pragmas::apply_connection_pragmas;

//! Conversions from external infrastructure errors into domain errors.

use arkive_common::storage::StorageError;
use arkive_domain::ArkiveError;
use rusqlite::Error as SqlError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ArkiveError);

impl From<InfraError> for ArkiveError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ArkiveError> for InfraError {
    fn from(value: ArkiveError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoArkiveError {
    fn into_arkive(self) -> ArkiveError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → ArkiveError */
/* -------------------------------------------------------------------------- */

impl IntoArkiveError for SqlError {
    fn into_arkive(self) -> ArkiveError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        ArkiveError::StoreLocked("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        ArkiveError::StoreLocked("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        ArkiveError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        ArkiveError::Database("foreign key constraint violation".into())
                    }
                    _ => ArkiveError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => ArkiveError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                ArkiveError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                ArkiveError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => ArkiveError::Database("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidParameterName(parameter_name) => {
                ArkiveError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => ArkiveError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => ArkiveError::Database("invalid SQL query".into()),
            other => ArkiveError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_arkive())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → ArkiveError */
/* -------------------------------------------------------------------------- */

impl IntoArkiveError for StorageError {
    fn into_arkive(self) -> ArkiveError {
        match self {
            StorageError::Rusqlite(err) => err.into_arkive(),
            err @ (StorageError::PoolExhausted | StorageError::Timeout(_)) => {
                ArkiveError::StoreLocked(err.to_string())
            }
            StorageError::Io(err) => ArkiveError::Io(err.to_string()),
            StorageError::InvalidConfig(message) => ArkiveError::Config(message),
            other => ArkiveError::Database(other.to_string()),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_arkive())
    }
}

/// Map a pool or query failure into the domain error.
pub fn map_storage_error(err: StorageError) -> ArkiveError {
    InfraError::from(err).into()
}

/// Map a failed `spawn_blocking` join into the domain error.
pub fn map_join_error(err: JoinError) -> ArkiveError {
    if err.is_cancelled() {
        ArkiveError::Internal("blocking task cancelled".into())
    } else {
        ArkiveError::Internal(format!("blocking task panicked: {err}"))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

//! Mapping of database errors onto storage errors.

use sea_orm::{DbErr, RuntimeErr, SqlErr};
use sqlx::error::DatabaseError;

use ledgerflow_core::engine::StoreError;

/// `serialization_failure`
const SERIALIZATION_FAILURE: &str = "40001";
/// `deadlock_detected`
const DEADLOCK_DETECTED: &str = "40P01";
/// `lock_not_available`, raised when `lock_timeout` expires
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// `query_canceled`, raised when `statement_timeout` expires
const QUERY_CANCELED: &str = "57014";

/// Returns the SQLSTATE code carried by a database error, if any.
fn sqlstate(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Conn(e) | DbErr::Exec(e) | DbErr::Query(e) => e,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db)) => {
            db.code().map(|code| code.into_owned())
        }
        _ => None,
    }
}

/// Returns the violated constraint's message if `err` is a unique violation.
pub(crate) fn unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => Some(message),
        _ => None,
    }
}

/// Classifies a database error.
///
/// Serialization failures and deadlocks become `Conflict`, lock and statement
/// timeouts become `Timeout`, and everything else is a `Backend` error.
pub(crate) fn store_error(err: DbErr) -> StoreError {
    match sqlstate(&err).as_deref() {
        Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => StoreError::Conflict(err.to_string()),
        Some(LOCK_NOT_AVAILABLE | QUERY_CANCELED) => StoreError::Timeout(err.to_string()),
        _ => {
            if let Some(message) = unique_violation(&err) {
                return StoreError::Duplicate {
                    entity: "row",
                    key: message,
                };
            }
            StoreError::Backend(err.to_string())
        }
    }
}

/// Error for a stored value that no longer parses into its domain type.
pub(crate) fn corrupt(what: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("invalid {what} in database: {detail}"))
}

//! # Storage Errors
//!
//! Everything a repository call can fail with.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   sqlx::Error ───────┐                                                  │
//! │   MigrateError ──────┼──► DbError ──► ApiError (apps/api)               │
//! │   CoreError ─────────┘                                                  │
//! │                                                                         │
//! │   Returning any of these from inside a transaction drops it            │
//! │   uncommitted; SQLite rolls the writes back.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind;
use thiserror::Error;

use godown_core::{CoreError, ValidationError};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write. `columns` is SQLite's
    /// `table.column` list.
    #[error("Already exists: {columns}")]
    UniqueViolation { columns: String },

    /// A referenced row is missing, e.g. a product for an unknown shop.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A guarded write matched no row because another writer got there first.
    #[error("Concurrent update of {entity} {id}")]
    Conflict { entity: String, id: String },

    /// Rejected by a business rule.
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite refused the statement for a reason not covered above.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::Conflict {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let db_err = match err {
            sqlx::Error::Database(db_err) => db_err,
            sqlx::Error::RowNotFound => return DbError::not_found("Record", "unknown"),
            sqlx::Error::PoolTimedOut => return DbError::PoolExhausted,
            sqlx::Error::PoolClosed => {
                return DbError::ConnectionFailed("pool is closed".to_string())
            }
            other => return DbError::Internal(other.to_string()),
        };

        let message = db_err.message();
        match db_err.kind() {
            // "UNIQUE constraint failed: products.shop_id, products.item_code"
            ErrorKind::UniqueViolation => DbError::UniqueViolation {
                columns: message
                    .split_once(": ")
                    .map_or(message, |(_, cols)| cols)
                    .to_string(),
            },
            ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                message: message.to_string(),
            },
            _ => DbError::QueryFailed(message.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_message_passes_through() {
        let err: DbError = CoreError::OrderNotFound("o-1".to_string()).into();
        assert_eq!(err.to_string(), "Order not found: o-1");
    }

    #[test]
    fn test_validation_error_becomes_domain() {
        let err: DbError = ValidationError::Required {
            field: "client_name".to_string(),
        }
        .into();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[test]
    fn test_pool_errors() {
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
    }
}

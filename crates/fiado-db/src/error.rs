//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Error Propagation                              │
//! │                                                                     │
//! │  SQLite Error (sqlx::Error)                                        │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  DbError (this module) ← Adds context and categorization           │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  LedgerError ← Domain(CoreError) | Store(DbError)                  │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  Caller branches: domain errors are expected outcomes, store       │
//! │  errors mean the operation rolled back and nothing changed         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use fiado_core::CoreError;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context. When one
/// surfaces from a compound operation, the transaction has been rolled
/// back and the store is unchanged.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate receipt number
    /// - Second account for the same customer
    #[error("Duplicate {field}: already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for plain database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Ledger Error
// =============================================================================

/// Error type for ledger and sale operations.
///
/// One `Result<T, LedgerError>` per operation, with the two failure
/// families kept apart:
///
/// - `Domain` - a business rule said no (expected, returned to caller)
/// - `Store` - the database failed (the transaction rolled back; logged
///   by the repository before returning)
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error(transparent)]
    Store(DbError),
}

impl LedgerError {
    /// True when this is a domain error (business rule), not a store
    /// failure.
    pub fn is_domain(&self) -> bool {
        matches!(self, LedgerError::Domain(_))
    }

    /// Returns the domain error, if that is what this is.
    pub fn as_domain(&self) -> Option<&CoreError> {
        match self {
            LedgerError::Domain(e) => Some(e),
            LedgerError::Store(_) => None,
        }
    }
}

impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        LedgerError::Store(err)
    }
}

/// Lets `?` lift raw sqlx failures straight into the store family.
impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Store(err.into())
    }
}

/// Result type for ledger and sale operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_vs_store() {
        let domain: LedgerError = CoreError::EmptySale.into();
        assert!(domain.is_domain());
        assert!(matches!(domain.as_domain(), Some(CoreError::EmptySale)));

        let store: LedgerError = DbError::PoolExhausted.into();
        assert!(!store.is_domain());
        assert!(store.as_domain().is_none());
    }

    #[test]
    fn test_messages_pass_through() {
        let err: LedgerError = CoreError::AccountNotFound("c9".to_string()).into();
        assert_eq!(err.to_string(), "No account found for customer: c9");

        let err: LedgerError = DbError::PoolExhausted.into();
        assert_eq!(err.to_string(), "Connection pool exhausted");
    }
}

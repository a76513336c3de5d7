//! Error types for sl-db

use thiserror::Error;

/// Database adapter errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] There was a problem connecting to the database: {0}")]
    ConnectionError(String),

    /// Query execution error (D002), carrying the driver message verbatim
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Schema log table could not be created or upgraded (D003)
    #[error("[D003] There was a problem creating the schema table '{table}': {message}")]
    SchemaUpgradeError { table: String, message: String },

    /// Invalid adapter configuration (D004)
    #[error("[D004] Invalid adapter configuration: {0}")]
    ConfigurationError(String),

    /// Bulk insert rows disagree on their columns (D005)
    #[error("[D005] Bulk insert into '{table}' requires identical columns in every row: row {row} has [{found}], expected [{expected}]")]
    MismatchedBulkColumns {
        table: String,
        row: usize,
        expected: String,
        found: String,
    },

    /// A schema log row could not be decoded (D006)
    #[error("[D006] Invalid schema log row: {0}")]
    InvalidRecord(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}

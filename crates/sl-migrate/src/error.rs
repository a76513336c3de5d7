//! Error types for sl-migrate

use sl_core::CoreError;
use sl_db::DbError;
use thiserror::Error;

/// Migration errors
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Environment or adapter configuration is unusable (M001)
    #[error("[M001] Invalid migration configuration: {0}")]
    Config(String),

    /// An insert batch mixes column sets (M002)
    #[error(
        "[M002] insert() into '{table}' does not support mixed column keys: row {row} has [{found}], expected [{expected}]. \
         Split rows with different columns into separate insert() calls"
    )]
    MixedInsertColumns {
        table: String,
        row: usize,
        expected: String,
        found: String,
    },

    /// Two migrations share a version (M003)
    #[error("[M003] Duplicate migration - \"{second}\" has the same version as \"{first}\" ({version})")]
    DuplicateVersion {
        version: i64,
        first: String,
        second: String,
    },

    /// Two migrations share a name (M004)
    #[error("[M004] Migration \"{name}\" ({second}) has the same name as the migration {first}")]
    DuplicateName { name: String, first: i64, second: i64 },

    /// A migration body reported its own failure (M005)
    #[error("[M005] Migration failed: {0}")]
    Failed(String),

    /// Adapter error, passed through unchanged
    #[error(transparent)]
    Db(#[from] DbError),

    /// Configuration error, passed through unchanged
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;

//! Error types for sl-import

use sl_db::DbError;
use std::path::PathBuf;
use thiserror::Error;

/// Dump import errors
#[derive(Error, Debug)]
pub enum ImportError {
    /// Dump file could not be opened (I001)
    #[error("[I001] Could not open import file \"{}\": {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Dump file held no statements (I002)
    #[error("[I002] File {} is empty", .path.display())]
    EmptyFile { path: PathBuf },

    /// A statement filled the whole read buffer (I003)
    #[error(
        "[I003] Statement {index} was exactly the buffer size ({limit} bytes) - most likely it was truncated?\nGot:\n{statement}"
    )]
    TruncatedStatement {
        index: usize,
        limit: usize,
        statement: String,
    },

    /// A statement is not valid UTF-8 (I004)
    #[error("[I004] Statement {index} is not valid UTF-8")]
    InvalidUtf8 { index: usize },

    /// Reading the dump failed part way (I005)
    #[error("[I005] Failed to read statement {index} from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        index: usize,
        #[source]
        source: std::io::Error,
    },

    /// Invalid importer settings (I006)
    #[error("[I006] Invalid import configuration: {0}")]
    Config(String),

    /// A statement was rejected by the database (I007)
    #[error("[I007] Statement {index} failed: {source}")]
    Execution {
        index: usize,
        #[source]
        source: DbError,
    },
}

/// Result type alias for ImportError
pub type ImportResult<T> = Result<T, ImportError>;

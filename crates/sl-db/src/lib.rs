//! sl-db - Database adapter layer for Shiplog
//!
//! This crate provides the [`Adapter`] trait, the uniform execution surface
//! every engine implements, together with DuckDB and SQLite implementations,
//! the table-prefix and timing decorators, the engine registry, and the
//! schema log row type.

pub mod duckdb;
pub mod error;
pub mod prefix;
pub mod registry;
pub mod schema_log;
pub(crate) mod sql;
pub mod sqlite;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod timed;
pub mod traits;
pub mod value;

pub use crate::duckdb::DuckDbAdapter;
pub use error::{DbError, DbResult};
pub use prefix::TablePrefixAdapter;
pub use registry::{AdapterFactory, AdapterRegistry};
pub use schema_log::MigrationRecord;
pub use sqlite::SqliteAdapter;
pub use timed::TimedOutputAdapter;
pub use traits::Adapter;
pub use value::{row, QueryResult, Row, Value};

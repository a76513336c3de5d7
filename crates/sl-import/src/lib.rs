//! sl-import - SQL dump importer for Shiplog
//!
//! [`StatementStream`] splits a dump into `;\n`-terminated statements without
//! holding more than one in memory. [`SqlDumpImporter`] feeds them, in order,
//! to an adapter.

pub mod error;
pub mod importer;
pub mod stream;

pub use error::{ImportError, ImportResult};
pub use importer::{ImportSummary, SqlDumpImporter};
pub use stream::{Statement, StatementStream, DEFAULT_MAX_STATEMENT_LENGTH};

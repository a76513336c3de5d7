//! sl-migrate - Migration executor for Shiplog
//!
//! A [`Migration`] is applied through an [`Environment`], which owns the
//! adapter chain for one configured database and records every successful
//! application in the schema log. [`Manager`] drives an ordered set of
//! migrations against an environment.

pub mod environment;
pub mod error;
pub mod manager;
pub mod migration;

pub use environment::Environment;
pub use error::{MigrateError, MigrateResult};
pub use manager::{Manager, MigrationState, MigrationStatus, OverallStatus, StatusReport};
pub use migration::{InsertData, Migration, MigrationContext};

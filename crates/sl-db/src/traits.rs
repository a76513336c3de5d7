//! Adapter trait definition

use crate::error::DbResult;
use crate::schema_log::MigrationRecord;
use crate::value::{QueryResult, Row, Value};
use chrono::NaiveDateTime;
use sl_core::{AdapterOptions, SharedOutput};

/// Uniform execution surface over one database connection.
///
/// Engines implement this directly; decorators such as
/// [`crate::TablePrefixAdapter`] and [`crate::TimedOutputAdapter`] own a
/// `Box<dyn Adapter>` and forward to it. Operations that need the database
/// connect lazily.
pub trait Adapter {
    /// Engine identifier for logging
    fn adapter_type(&self) -> &str;

    /// Options this adapter was built with
    fn options(&self) -> &AdapterOptions;

    /// Output sink used for dry-run and timing output
    fn output(&self) -> SharedOutput;

    /// Schema log table name
    fn schema_table_name(&self) -> &str {
        &self.options().schema_table
    }

    /// Whether statements are reported instead of executed
    fn is_dry_run(&self) -> bool {
        self.options().dry_run
    }

    /// Connect if not already connected, then ensure the schema table exists
    /// and has the current shape
    fn connect(&mut self) -> DbResult<()>;

    /// Drop the connection; a no-op when already disconnected
    fn disconnect(&mut self);

    /// Whether a live connection is held
    fn is_connected(&self) -> bool;

    /// Execute a non-query statement, returning the affected row count
    fn execute(&mut self, sql: &str) -> DbResult<usize>;

    /// Execute a non-query statement with `?` placeholders bound to `params`,
    /// returning the affected row count
    fn execute_with_params(&mut self, sql: &str, params: &[Value]) -> DbResult<usize>;

    /// Run a query and materialize its result
    fn query(&mut self, sql: &str) -> DbResult<QueryResult>;

    /// First row of a query, or `None` for an empty result
    fn fetch_row(&mut self, sql: &str) -> DbResult<Option<Row>> {
        Ok(self.query(sql)?.into_rows().into_iter().next())
    }

    /// All rows of a query
    fn fetch_all(&mut self, sql: &str) -> DbResult<Vec<Row>> {
        Ok(self.query(sql)?.into_rows())
    }

    /// Insert one row using bound parameters
    fn insert(&mut self, table: &str, row: &Row) -> DbResult<()>;

    /// Insert many rows in one multi-row statement. Every row must have the
    /// first row's columns.
    fn bulk_insert(&mut self, table: &str, rows: &[Row]) -> DbResult<()>;

    /// Whether a table exists
    fn has_table(&mut self, table: &str) -> DbResult<bool>;

    /// Whether a column exists on a table
    fn has_column(&mut self, table: &str, column: &str) -> DbResult<bool>;

    /// Quote a single identifier
    fn quote_column_name(&self, name: &str) -> String;

    /// Quote a possibly schema-qualified table name, part by part
    fn quote_table_name(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_column_name(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Whether the engine supports transactional DDL
    fn has_transactions(&self) -> bool;

    fn begin_transaction(&mut self) -> DbResult<()>;

    fn commit_transaction(&mut self) -> DbResult<()>;

    fn rollback_transaction(&mut self) -> DbResult<()>;

    /// Append one record to the schema log
    fn migrated(
        &mut self,
        version: i64,
        name: &str,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> DbResult<()> {
        let record = MigrationRecord::new(version, name, start_time, end_time);
        let table = self.schema_table_name().to_string();
        self.insert(&table, &record.to_row())
    }

    /// Every schema log record, in the configured version order
    fn get_version_log(&mut self) -> DbResult<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT * FROM {} ORDER BY {}",
            self.quote_table_name(self.schema_table_name()),
            self.options().version_order.order_by()
        );
        self.fetch_all(&sql)?
            .iter()
            .map(MigrationRecord::from_row)
            .collect()
    }

    /// Every applied version, in the configured version order
    fn get_versions(&mut self) -> DbResult<Vec<i64>> {
        Ok(self
            .get_version_log()?
            .into_iter()
            .map(|record| record.version)
            .collect())
    }
}

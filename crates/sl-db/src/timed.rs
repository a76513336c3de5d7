//! Timing decorator
//!
//! At verbose output, data-changing commands are announced before they run
//! and followed by their elapsed time:
//!
//! ```text
//!  -- insert('users')
//!     -> 0.0012s
//! ```

use crate::error::DbResult;
use crate::schema_log::MigrationRecord;
use crate::traits::Adapter;
use crate::value::{QueryResult, Row, Value};
use chrono::NaiveDateTime;
use sl_core::{AdapterOptions, Output, SharedOutput};
use std::time::Instant;

/// Adapter decorator that reports per-command timing
pub struct TimedOutputAdapter {
    inner: Box<dyn Adapter>,
    output: SharedOutput,
}

impl TimedOutputAdapter {
    /// Wrap `inner`, reporting to its output sink
    pub fn new(inner: Box<dyn Adapter>) -> Self {
        let output = inner.output();
        Self { inner, output }
    }

    /// Unwrap the decorated adapter
    pub fn into_inner(self) -> Box<dyn Adapter> {
        self.inner
    }

    /// Announce a command, e.g. ` -- insert('users')`. Silent below verbose.
    pub fn write_command(&self, command: &str, args: &[&str]) {
        if !self.output.is_verbose() {
            return;
        }
        if args.is_empty() {
            self.output.writeln(&format!(" -- {command}"));
        } else {
            let quoted: Vec<String> = args.iter().map(|a| format!("'{a}'")).collect();
            self.output
                .writeln(&format!(" -- {}({})", command, quoted.join(", ")));
        }
    }

    fn timed<T>(
        &mut self,
        command: &str,
        args: &[&str],
        run: impl FnOnce(&mut dyn Adapter) -> DbResult<T>,
    ) -> DbResult<T> {
        let started = Instant::now();
        self.write_command(command, args);
        let result = run(self.inner.as_mut())?;
        let elapsed = started.elapsed().as_secs_f64();
        log::debug!("{command} took {elapsed:.4}s");
        if self.output.is_verbose() {
            self.output.writeln(&format!("    -> {elapsed:.4}s"));
        }
        Ok(result)
    }
}

impl Adapter for TimedOutputAdapter {
    fn adapter_type(&self) -> &str {
        self.inner.adapter_type()
    }

    fn options(&self) -> &AdapterOptions {
        self.inner.options()
    }

    fn output(&self) -> SharedOutput {
        self.output.clone()
    }

    fn schema_table_name(&self) -> &str {
        self.inner.schema_table_name()
    }

    fn is_dry_run(&self) -> bool {
        self.inner.is_dry_run()
    }

    fn connect(&mut self) -> DbResult<()> {
        self.inner.connect()
    }

    fn disconnect(&mut self) {
        self.inner.disconnect()
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn execute(&mut self, sql: &str) -> DbResult<usize> {
        self.timed("execute", &[], |inner| inner.execute(sql))
    }

    fn execute_with_params(&mut self, sql: &str, params: &[Value]) -> DbResult<usize> {
        self.timed("execute", &[], |inner| inner.execute_with_params(sql, params))
    }

    fn query(&mut self, sql: &str) -> DbResult<QueryResult> {
        self.inner.query(sql)
    }

    fn fetch_row(&mut self, sql: &str) -> DbResult<Option<Row>> {
        self.inner.fetch_row(sql)
    }

    fn fetch_all(&mut self, sql: &str) -> DbResult<Vec<Row>> {
        self.inner.fetch_all(sql)
    }

    fn insert(&mut self, table: &str, row: &Row) -> DbResult<()> {
        self.timed("insert", &[table], |inner| inner.insert(table, row))
    }

    fn bulk_insert(&mut self, table: &str, rows: &[Row]) -> DbResult<()> {
        self.timed("bulkinsert", &[table], |inner| inner.bulk_insert(table, rows))
    }

    fn has_table(&mut self, table: &str) -> DbResult<bool> {
        self.inner.has_table(table)
    }

    fn has_column(&mut self, table: &str, column: &str) -> DbResult<bool> {
        self.inner.has_column(table, column)
    }

    fn quote_column_name(&self, name: &str) -> String {
        self.inner.quote_column_name(name)
    }

    fn quote_table_name(&self, name: &str) -> String {
        self.inner.quote_table_name(name)
    }

    fn has_transactions(&self) -> bool {
        self.inner.has_transactions()
    }

    fn begin_transaction(&mut self) -> DbResult<()> {
        self.inner.begin_transaction()
    }

    fn commit_transaction(&mut self) -> DbResult<()> {
        self.inner.commit_transaction()
    }

    fn rollback_transaction(&mut self) -> DbResult<()> {
        self.inner.rollback_transaction()
    }

    fn migrated(
        &mut self,
        version: i64,
        name: &str,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> DbResult<()> {
        self.inner.migrated(version, name, start_time, end_time)
    }

    fn get_version_log(&mut self) -> DbResult<Vec<MigrationRecord>> {
        self.inner.get_version_log()
    }

    fn get_versions(&mut self) -> DbResult<Vec<i64>> {
        self.inner.get_versions()
    }
}

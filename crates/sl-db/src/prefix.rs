//! Table-prefix decorator
//!
//! Rewrites the table names of table-bearing operations to
//! `prefix + name + suffix` before forwarding them. The schema log table is
//! never rewritten.

use crate::error::DbResult;
use crate::schema_log::MigrationRecord;
use crate::traits::Adapter;
use crate::value::{QueryResult, Row, Value};
use chrono::NaiveDateTime;
use sl_core::{AdapterOptions, SharedOutput};

/// Adapter decorator applying a table prefix and suffix
pub struct TablePrefixAdapter {
    inner: Box<dyn Adapter>,
    prefix: String,
    suffix: String,
}

impl TablePrefixAdapter {
    /// Wrap `inner`, taking the prefix and suffix from its options
    pub fn new(inner: Box<dyn Adapter>) -> Self {
        let prefix = inner.options().table_prefix.clone().unwrap_or_default();
        let suffix = inner.options().table_suffix.clone().unwrap_or_default();
        Self::with_affixes(inner, prefix, suffix)
    }

    /// Wrap `inner` with an explicit prefix and suffix
    pub fn with_affixes(
        inner: Box<dyn Adapter>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Name of `table` as it exists in the database
    pub fn adapter_table_name(&self, table: &str) -> String {
        format!("{}{}{}", self.prefix, table, self.suffix)
    }

    /// Unwrap the decorated adapter
    pub fn into_inner(self) -> Box<dyn Adapter> {
        self.inner
    }
}

impl Adapter for TablePrefixAdapter {
    fn adapter_type(&self) -> &str {
        self.inner.adapter_type()
    }

    fn options(&self) -> &AdapterOptions {
        self.inner.options()
    }

    fn output(&self) -> SharedOutput {
        self.inner.output()
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
        self.inner.execute(sql)
    }

    fn execute_with_params(&mut self, sql: &str, params: &[Value]) -> DbResult<usize> {
        self.inner.execute_with_params(sql, params)
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
        let table = self.adapter_table_name(table);
        self.inner.insert(&table, row)
    }

    fn bulk_insert(&mut self, table: &str, rows: &[Row]) -> DbResult<()> {
        let table = self.adapter_table_name(table);
        self.inner.bulk_insert(&table, rows)
    }

    fn has_table(&mut self, table: &str) -> DbResult<bool> {
        let table = self.adapter_table_name(table);
        self.inner.has_table(&table)
    }

    fn has_column(&mut self, table: &str, column: &str) -> DbResult<bool> {
        let table = self.adapter_table_name(table);
        self.inner.has_column(&table, column)
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

//! Migration trait and the context a migration body runs against

use crate::error::{MigrateError, MigrateResult};
use sl_core::SharedOutput;
use sl_db::{Adapter, QueryResult, Row, Value};

/// A single versioned schema change
pub trait Migration {
    /// Version number, conventionally a `YYYYMMDDHHMMSS` timestamp
    fn version(&self) -> i64;

    /// Human-readable name recorded in the schema log
    fn name(&self) -> &str;

    /// Apply the change
    fn up(&self, ctx: &mut MigrationContext<'_>) -> MigrateResult<()>;
}

/// Rows handed to [`MigrationContext::insert`]: one row or a batch
#[derive(Debug, Clone, PartialEq)]
pub enum InsertData {
    Row(Row),
    Rows(Vec<Row>),
}

impl InsertData {
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            InsertData::Row(row) => vec![row],
            InsertData::Rows(rows) => rows,
        }
    }
}

impl From<Row> for InsertData {
    fn from(row: Row) -> Self {
        InsertData::Row(row)
    }
}

impl From<Vec<Row>> for InsertData {
    fn from(rows: Vec<Row>) -> Self {
        InsertData::Rows(rows)
    }
}

/// Adapter access for a running migration
pub struct MigrationContext<'a> {
    adapter: &'a mut dyn Adapter,
    version: i64,
}

impl<'a> MigrationContext<'a> {
    pub fn new(adapter: &'a mut dyn Adapter, version: i64) -> Self {
        Self { adapter, version }
    }

    /// Version of the migration being applied
    pub fn version(&self) -> i64 {
        self.version
    }

    /// The underlying adapter, for operations the context does not wrap
    pub fn adapter(&mut self) -> &mut dyn Adapter {
        &mut *self.adapter
    }

    pub fn output(&self) -> SharedOutput {
        self.adapter.output()
    }

    pub fn execute(&mut self, sql: &str) -> MigrateResult<usize> {
        Ok(self.adapter.execute(sql)?)
    }

    /// Execute `sql` with its `?` placeholders bound to `params`
    pub fn prepare_and_execute(&mut self, sql: &str, params: &[Value]) -> MigrateResult<usize> {
        Ok(self.adapter.execute_with_params(sql, params)?)
    }

    pub fn query(&mut self, sql: &str) -> MigrateResult<QueryResult> {
        Ok(self.adapter.query(sql)?)
    }

    pub fn fetch_row(&mut self, sql: &str) -> MigrateResult<Option<Row>> {
        Ok(self.adapter.fetch_row(sql)?)
    }

    pub fn fetch_all(&mut self, sql: &str) -> MigrateResult<Vec<Row>> {
        Ok(self.adapter.fetch_all(sql)?)
    }

    pub fn has_table(&mut self, table: &str) -> MigrateResult<bool> {
        Ok(self.adapter.has_table(table)?)
    }

    pub fn has_column(&mut self, table: &str, column: &str) -> MigrateResult<bool> {
        Ok(self.adapter.has_column(table, column)?)
    }

    /// Insert one row or a batch in a single statement.
    ///
    /// Every row must carry exactly the first row's columns; a mixed batch
    /// is rejected before anything reaches the database.
    pub fn insert(&mut self, table: &str, data: impl Into<InsertData>) -> MigrateResult<()> {
        let rows = data.into().into_rows();
        check_insert_columns(table, &rows)?;
        self.adapter.bulk_insert(table, &rows)?;
        Ok(())
    }
}

fn check_insert_columns(table: &str, rows: &[Row]) -> MigrateResult<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    for (idx, row) in rows.iter().enumerate().skip(1) {
        if !row.keys().eq(first.keys()) {
            return Err(MigrateError::MixedInsertColumns {
                table: table.to_string(),
                row: idx + 1,
                expected: join_keys(first),
                found: join_keys(row),
            });
        }
    }
    Ok(())
}

fn join_keys(row: &Row) -> String {
    row.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;

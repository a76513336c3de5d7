//! DuckDB adapter implementation

use crate::error::{DbError, DbResult};
use crate::schema_log::{ensure_schema_table, LogColumn, SchemaDialect};
use crate::sql::{batch_columns, batch_values, insert_sql, render_dry_run};
use crate::traits::Adapter;
use crate::value::{QueryResult, Row, Value};
use chrono::{DateTime, NaiveDateTime};
use duckdb::types::{TimeUnit, ToSqlOutput, Value as DuckValue};
use duckdb::{params, params_from_iter, Connection, ToSql};
use sl_core::{AdapterOptions, Output, SharedOutput};
use std::path::Path;

/// Registry name of this adapter
pub const ADAPTER_TYPE: &str = "duckdb";

const MEMORY_PATH: &str = ":memory:";

/// DuckDB adapter
pub struct DuckDbAdapter {
    options: AdapterOptions,
    output: SharedOutput,
    conn: Option<Connection>,
}

impl DuckDbAdapter {
    /// Create an unconnected adapter; the connection opens on first use
    pub fn new(options: AdapterOptions, output: SharedOutput) -> Self {
        Self {
            options,
            output,
            conn: None,
        }
    }

    /// Connected adapter over a fresh in-memory database
    pub fn in_memory(output: SharedOutput) -> DbResult<Self> {
        let mut adapter = Self::new(
            AdapterOptions::new(ADAPTER_TYPE).with_path(MEMORY_PATH),
            output,
        );
        adapter.connect()?;
        Ok(adapter)
    }

    /// Adopt an already open connection. The schema table is ensured
    /// immediately.
    pub fn with_connection(
        conn: Connection,
        options: AdapterOptions,
        output: SharedOutput,
    ) -> DbResult<Self> {
        let mut adapter = Self::new(options, output);
        adapter.adopt(conn)?;
        Ok(adapter)
    }

    /// [`crate::AdapterFactory`] for the registry
    pub fn factory(options: AdapterOptions, output: SharedOutput) -> DbResult<Box<dyn Adapter>> {
        Ok(Box::new(Self::new(options, output)))
    }

    /// The native connection, connecting first if needed
    pub fn connection(&mut self) -> DbResult<&Connection> {
        self.ensure_connected()?;
        self.live()
    }

    fn live(&self) -> DbResult<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| DbError::ConnectionError("DuckDB connection is not open".to_string()))
    }

    fn ensure_connected(&mut self) -> DbResult<()> {
        if self.conn.is_none() {
            self.connect()?;
        }
        Ok(())
    }

    fn open(&self) -> DbResult<Connection> {
        let path = self.options.path.as_deref().ok_or_else(|| {
            DbError::ConfigurationError(
                "the duckdb adapter requires a 'path' (use \":memory:\" for an in-memory database)"
                    .to_string(),
            )
        })?;
        let opened = if path == MEMORY_PATH {
            Connection::open_in_memory()
        } else {
            Connection::open(Path::new(path))
        };
        opened.map_err(|e| DbError::ConnectionError(format!("{}: {}", e, path)))
    }

    fn adopt(&mut self, conn: Connection) -> DbResult<()> {
        let table = self.options.schema_table.clone();
        let quoted = self.quote_table_name(&table);
        ensure_schema_table(&DuckDbSchema { conn: &conn }, &table, &quoted)?;
        self.conn = Some(conn);
        Ok(())
    }

    fn run_control(&mut self, sql: &str) -> DbResult<()> {
        if self.options.dry_run {
            self.output.writeln(sql);
            return Ok(());
        }
        self.ensure_connected()?;
        self.live()?.execute_batch(sql)?;
        Ok(())
    }

    fn insert_rows(&mut self, table: &str, rows: &[Row]) -> DbResult<()> {
        let Some(columns) = batch_columns(table, rows)? else {
            return Ok(());
        };
        let quoted_columns: Vec<String> =
            columns.iter().map(|c| self.quote_column_name(c)).collect();
        let sql = insert_sql(&self.quote_table_name(table), &quoted_columns, rows.len());
        let values = batch_values(rows);

        if self.options.dry_run {
            self.output.writeln(&render_dry_run(&sql, &values));
            return Ok(());
        }

        self.ensure_connected()?;
        let mut stmt = self.live()?.prepare(&sql)?;
        stmt.execute(params_from_iter(values))?;
        Ok(())
    }
}

impl Adapter for DuckDbAdapter {
    fn adapter_type(&self) -> &str {
        ADAPTER_TYPE
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }

    fn output(&self) -> SharedOutput {
        self.output.clone()
    }

    fn connect(&mut self) -> DbResult<()> {
        if self.conn.is_some() {
            return Ok(());
        }
        log::debug!(
            "Connecting to DuckDB at {}",
            self.options.path.as_deref().unwrap_or("<unset>")
        );
        let conn = self.open()?;
        self.adopt(conn)
    }

    fn disconnect(&mut self) {
        if self.conn.take().is_some() {
            log::debug!("Disconnected from DuckDB");
        }
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn execute(&mut self, sql: &str) -> DbResult<usize> {
        if self.options.dry_run {
            self.output.writeln(sql);
            return Ok(0);
        }
        self.ensure_connected()?;
        Ok(self.live()?.execute(sql, [])?)
    }

    fn execute_with_params(&mut self, sql: &str, params: &[Value]) -> DbResult<usize> {
        if self.options.dry_run {
            let values: Vec<&Value> = params.iter().collect();
            self.output.writeln(&render_dry_run(sql, &values));
            return Ok(0);
        }
        self.ensure_connected()?;
        let mut stmt = self.live()?.prepare(sql)?;
        Ok(stmt.execute(params_from_iter(params))?)
    }

    fn query(&mut self, sql: &str) -> DbResult<QueryResult> {
        self.ensure_connected()?;
        let mut stmt = self.live()?.prepare(sql)?;
        let rows = stmt
            .query_map([], |row| {
                let column_count = row.as_ref().column_count();
                (0..column_count)
                    .map(|i| row.get::<_, DuckValue>(i).map(from_duckdb_value))
                    .collect::<duckdb::Result<Vec<Value>>>()
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;
        let columns = (0..stmt.column_count())
            .map(|i| stmt.column_name(i).map_or("?".to_string(), |v| v.to_string()))
            .collect();
        Ok(QueryResult { columns, rows })
    }

    fn insert(&mut self, table: &str, row: &Row) -> DbResult<()> {
        self.insert_rows(table, std::slice::from_ref(row))
    }

    fn bulk_insert(&mut self, table: &str, rows: &[Row]) -> DbResult<()> {
        self.insert_rows(table, rows)
    }

    fn has_table(&mut self, table: &str) -> DbResult<bool> {
        self.ensure_connected()?;
        table_exists(self.live()?, table)
    }

    fn has_column(&mut self, table: &str, column: &str) -> DbResult<bool> {
        self.ensure_connected()?;
        Ok(column_names(self.live()?, table)?
            .iter()
            .any(|c| c.eq_ignore_ascii_case(column)))
    }

    fn quote_column_name(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn has_transactions(&self) -> bool {
        true
    }

    fn begin_transaction(&mut self) -> DbResult<()> {
        self.run_control("BEGIN TRANSACTION")
    }

    fn commit_transaction(&mut self) -> DbResult<()> {
        self.run_control("COMMIT")
    }

    fn rollback_transaction(&mut self) -> DbResult<()> {
        self.run_control("ROLLBACK")
    }
}

/// Split `schema.table`, defaulting to the `main` schema
fn split_qualified(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("main", name),
    }
}

fn table_exists(conn: &Connection, name: &str) -> DbResult<bool> {
    let (schema, table) = split_qualified(name);
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
        params![schema, table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn column_names(conn: &Connection, name: &str) -> DbResult<Vec<String>> {
    let (schema, table) = split_qualified(name);
    let mut stmt = conn.prepare(
        "SELECT column_name FROM information_schema.columns \
         WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position",
    )?;
    let names = stmt
        .query_map(params![schema, table], |row| row.get::<_, String>(0))?
        .collect::<duckdb::Result<Vec<_>>>()?;
    Ok(names)
}

struct DuckDbSchema<'a> {
    conn: &'a Connection,
}

impl SchemaDialect for DuckDbSchema<'_> {
    fn table_exists(&self, table: &str) -> DbResult<bool> {
        table_exists(self.conn, table)
    }

    fn column_names(&self, table: &str) -> DbResult<Vec<String>> {
        column_names(self.conn, table)
    }

    fn create_table_sql(&self, quoted_table: &str) -> String {
        format!(
            "CREATE TABLE {quoted_table} (\n    \
             \"version\" BIGINT NOT NULL PRIMARY KEY,\n    \
             \"migration_name\" VARCHAR(100),\n    \
             \"start_time\" TIMESTAMP,\n    \
             \"end_time\" TIMESTAMP,\n    \
             \"breakpoint\" BOOLEAN NOT NULL DEFAULT false\n)"
        )
    }

    fn add_column_sql(&self, quoted_table: &str, column: LogColumn) -> String {
        match column {
            LogColumn::MigrationName => {
                format!("ALTER TABLE {quoted_table} ADD COLUMN \"migration_name\" VARCHAR(100)")
            }
            // DuckDB cannot add NOT NULL columns; existing rows take the default
            LogColumn::Breakpoint => {
                format!("ALTER TABLE {quoted_table} ADD COLUMN \"breakpoint\" BOOLEAN DEFAULT false")
            }
        }
    }

    fn run_ddl(&self, sql: &str) -> DbResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            Value::Null => DuckValue::Null,
            Value::Bool(b) => DuckValue::Boolean(*b),
            Value::Int(n) => DuckValue::BigInt(*n),
            Value::Float(f) => DuckValue::Double(*f),
            Value::Text(s) => DuckValue::Text(s.clone()),
            Value::Blob(b) => DuckValue::Blob(b.clone()),
            Value::Timestamp(ts) => {
                DuckValue::Timestamp(TimeUnit::Microsecond, ts.and_utc().timestamp_micros())
            }
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

fn from_duckdb_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(n) => Value::Int(i64::from(n)),
        DuckValue::SmallInt(n) => Value::Int(i64::from(n)),
        DuckValue::Int(n) => Value::Int(i64::from(n)),
        DuckValue::BigInt(n) => Value::Int(n),
        DuckValue::UTinyInt(n) => Value::Int(i64::from(n)),
        DuckValue::USmallInt(n) => Value::Int(i64::from(n)),
        DuckValue::UInt(n) => Value::Int(i64::from(n)),
        DuckValue::HugeInt(n) => i64::try_from(n).map_or_else(|_| Value::Text(n.to_string()), Value::Int),
        DuckValue::UBigInt(n) => i64::try_from(n).map_or_else(|_| Value::Text(n.to_string()), Value::Int),
        DuckValue::Float(f) => Value::Float(f64::from(f)),
        DuckValue::Double(f) => Value::Float(f),
        DuckValue::Text(s) => Value::Text(s),
        DuckValue::Blob(b) => Value::Blob(b),
        DuckValue::Timestamp(unit, raw) => timestamp_from_unit(unit, raw)
            .map_or_else(|| Value::Text(raw.to_string()), Value::Timestamp),
        other => Value::Text(format!("{other:?}")),
    }
}

fn timestamp_from_unit(unit: TimeUnit, raw: i64) -> Option<NaiveDateTime> {
    let micros = match unit {
        TimeUnit::Second => raw.checked_mul(1_000_000)?,
        TimeUnit::Millisecond => raw.checked_mul(1_000)?,
        TimeUnit::Microsecond => raw,
        TimeUnit::Nanosecond => raw / 1_000,
    };
    let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).ok()?;
    DateTime::from_timestamp(micros.div_euclid(1_000_000), nanos).map(|dt| dt.naive_utc())
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;

//! SQLite adapter implementation
//!
//! SQLite has no native boolean or timestamp types: booleans are bound as
//! `0`/`1` and timestamps as [`TIMESTAMP_FORMAT`] text, which sorts
//! chronologically.

use crate::error::{DbError, DbResult};
use crate::schema_log::{ensure_schema_table, LogColumn, SchemaDialect};
use crate::sql::{batch_columns, batch_values, insert_sql, render_dry_run};
use crate::traits::Adapter;
use crate::value::{QueryResult, Row, Value, TIMESTAMP_FORMAT};
use rusqlite::types::{ToSqlOutput, Value as SqliteValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection, Params, ToSql};
use sl_core::{AdapterOptions, Output, SharedOutput};
use std::path::Path;

/// Registry name of this adapter
pub const ADAPTER_TYPE: &str = "sqlite";

const MEMORY_PATH: &str = ":memory:";

/// SQLite adapter
pub struct SqliteAdapter {
    options: AdapterOptions,
    output: SharedOutput,
    conn: Option<Connection>,
}

impl SqliteAdapter {
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
            .ok_or_else(|| DbError::ConnectionError("SQLite connection is not open".to_string()))
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
                "the sqlite adapter requires a 'path' (use \":memory:\" for an in-memory database)"
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
        ensure_schema_table(&SqliteSchema { conn: &conn }, &table, &quoted)?;
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

impl Adapter for SqliteAdapter {
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
            "Connecting to SQLite at {}",
            self.options.path.as_deref().unwrap_or("<unset>")
        );
        let conn = self.open()?;
        self.adopt(conn)
    }

    fn disconnect(&mut self) {
        if self.conn.take().is_some() {
            log::debug!("Disconnected from SQLite");
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
        run_statement(self.live()?, sql, params![])
    }

    fn execute_with_params(&mut self, sql: &str, params: &[Value]) -> DbResult<usize> {
        if self.options.dry_run {
            let values: Vec<&Value> = params.iter().collect();
            self.output.writeln(&render_dry_run(sql, &values));
            return Ok(0);
        }
        self.ensure_connected()?;
        run_statement(self.live()?, sql, params_from_iter(params))
    }

    fn query(&mut self, sql: &str) -> DbResult<QueryResult> {
        self.ensure_connected()?;
        let mut stmt = self.live()?.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();
        let rows = stmt
            .query_map([], |row| {
                (0..column_count)
                    .map(|i| row.get_ref(i).map(from_sqlite_value))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
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
        format!("`{}`", name.replace('`', "``"))
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

/// Run one statement. Rows it returns (`PRAGMA journal_mode`, a stray
/// `SELECT` in a dump) are stepped through and dropped.
fn run_statement<P: Params>(conn: &Connection, sql: &str, params: P) -> DbResult<usize> {
    let mut stmt = conn.prepare(sql)?;
    if stmt.column_count() == 0 {
        return Ok(stmt.execute(params)?);
    }
    let mut rows = stmt.query(params)?;
    while rows.next()?.is_some() {}
    Ok(0)
}

/// Catalog table for `schema.table` names, or `sqlite_master` for bare ones
fn catalog_for(name: &str) -> (String, &str) {
    match name.rfind('.') {
        Some(pos) => (
            format!("`{}`.sqlite_master", name[..pos].replace('`', "``")),
            &name[pos + 1..],
        ),
        None => ("sqlite_master".to_string(), name),
    }
}

fn table_exists(conn: &Connection, name: &str) -> DbResult<bool> {
    let (catalog, table) = catalog_for(name);
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {catalog} WHERE type = 'table' AND name = ?1"),
        params![table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn column_names(conn: &Connection, name: &str) -> DbResult<Vec<String>> {
    let (schema, table) = match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("main", name),
    };
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1, ?2) ORDER BY cid")?;
    let names = stmt
        .query_map(params![table, schema], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

struct SqliteSchema<'a> {
    conn: &'a Connection,
}

impl SchemaDialect for SqliteSchema<'_> {
    fn table_exists(&self, table: &str) -> DbResult<bool> {
        table_exists(self.conn, table)
    }

    fn column_names(&self, table: &str) -> DbResult<Vec<String>> {
        column_names(self.conn, table)
    }

    fn create_table_sql(&self, quoted_table: &str) -> String {
        format!(
            "CREATE TABLE {quoted_table} (\n    \
             `version` BIGINT NOT NULL PRIMARY KEY,\n    \
             `migration_name` VARCHAR(100) NULL,\n    \
             `start_time` TIMESTAMP NULL,\n    \
             `end_time` TIMESTAMP NULL,\n    \
             `breakpoint` TINYINT(1) NOT NULL DEFAULT 0\n)"
        )
    }

    fn add_column_sql(&self, quoted_table: &str, column: LogColumn) -> String {
        match column {
            LogColumn::MigrationName => {
                format!("ALTER TABLE {quoted_table} ADD COLUMN `migration_name` VARCHAR(100) NULL")
            }
            LogColumn::Breakpoint => {
                format!("ALTER TABLE {quoted_table} ADD COLUMN `breakpoint` TINYINT(1) NOT NULL DEFAULT 0")
            }
        }
    }

    fn run_ddl(&self, sql: &str) -> DbResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Value::Null => SqliteValue::Null,
            Value::Bool(b) => SqliteValue::Integer(i64::from(*b)),
            Value::Int(n) => SqliteValue::Integer(*n),
            Value::Float(f) => SqliteValue::Real(*f),
            Value::Text(s) => SqliteValue::Text(s.clone()),
            Value::Blob(b) => SqliteValue::Blob(b.clone()),
            Value::Timestamp(ts) => SqliteValue::Text(ts.format(TIMESTAMP_FORMAT).to_string()),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

fn from_sqlite_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Int(n),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;

//! The schema log: the durable ledger of applied migrations.
//!
//! Each engine stores the log in a table (default `phinxlog`) with the columns
//! `version`, `migration_name`, `start_time`, `end_time`, and `breakpoint`.
//! Older tables that predate `migration_name` or `breakpoint` are upgraded in
//! place by [`ensure_schema_table`], additively and idempotently.

use crate::error::{DbError, DbResult};
use crate::value::{Row, Value};
use chrono::NaiveDateTime;

/// Maximum stored length of `migration_name`, in characters
pub const MAX_NAME_LENGTH: usize = 100;

/// Columns that older schema tables may lack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogColumn {
    MigrationName,
    Breakpoint,
}

impl LogColumn {
    /// Upgradeable columns, in the order they are added
    pub const UPGRADEABLE: [LogColumn; 2] = [LogColumn::MigrationName, LogColumn::Breakpoint];

    /// Column name in the schema table
    pub fn name(&self) -> &'static str {
        match self {
            LogColumn::MigrationName => "migration_name",
            LogColumn::Breakpoint => "breakpoint",
        }
    }
}

/// One row of the schema log
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationRecord {
    pub version: i64,
    pub migration_name: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub breakpoint: bool,
}

impl MigrationRecord {
    /// Record for a completed migration; the name is truncated to
    /// [`MAX_NAME_LENGTH`] characters.
    pub fn new(version: i64, name: &str, start_time: NaiveDateTime, end_time: NaiveDateTime) -> Self {
        Self {
            version,
            migration_name: Some(truncate_name(name)),
            start_time: Some(start_time),
            end_time: Some(end_time),
            breakpoint: false,
        }
    }

    /// Decode a row fetched from the schema table.
    ///
    /// Accepts the representations different engines return: integer or
    /// boolean `breakpoint`, native or text timestamps.
    pub fn from_row(row: &Row) -> DbResult<Self> {
        let version = row
            .get("version")
            .and_then(Value::as_i64)
            .ok_or_else(|| DbError::InvalidRecord(format!("missing or non-integer version in {row:?}")))?;

        let migration_name = match row.get("migration_name") {
            None | Some(Value::Null) => None,
            Some(Value::Text(s)) => Some(s.clone()),
            Some(other) => {
                return Err(DbError::InvalidRecord(format!(
                    "version {version}: migration_name is not text: {other:?}"
                )))
            }
        };

        let start_time = decode_timestamp(row, "start_time", version)?;
        let end_time = decode_timestamp(row, "end_time", version)?;

        let breakpoint = match row.get("breakpoint") {
            None | Some(Value::Null) => false,
            Some(value) => value.as_bool().ok_or_else(|| {
                DbError::InvalidRecord(format!("version {version}: breakpoint is not boolean: {value:?}"))
            })?,
        };

        Ok(Self {
            version,
            migration_name,
            start_time,
            end_time,
            breakpoint,
        })
    }

    /// Encode for insertion via bound parameters
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("version".to_string(), Value::Int(self.version));
        row.insert(
            "migration_name".to_string(),
            Value::from(self.migration_name.clone()),
        );
        row.insert("start_time".to_string(), Value::from(self.start_time));
        row.insert("end_time".to_string(), Value::from(self.end_time));
        row.insert("breakpoint".to_string(), Value::Bool(self.breakpoint));
        row
    }
}

fn decode_timestamp(row: &Row, column: &str, version: i64) -> DbResult<Option<NaiveDateTime>> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_timestamp().map(Some).ok_or_else(|| {
            DbError::InvalidRecord(format!("version {version}: {column} is not a timestamp: {value:?}"))
        }),
    }
}

/// Truncate a migration name to [`MAX_NAME_LENGTH`] characters
pub fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_NAME_LENGTH).collect()
}

/// Upgradeable columns absent from `existing` (compared case-insensitively)
pub fn missing_columns<S: AsRef<str>>(existing: &[S]) -> Vec<LogColumn> {
    LogColumn::UPGRADEABLE
        .into_iter()
        .filter(|wanted| {
            !existing
                .iter()
                .any(|have| have.as_ref().eq_ignore_ascii_case(wanted.name()))
        })
        .collect()
}

/// Engine-specific hooks used to create or upgrade the schema table.
///
/// Implementations run directly against the connection; dry-run mode does
/// not apply to schema maintenance.
pub(crate) trait SchemaDialect {
    /// Whether `table` exists
    fn table_exists(&self, table: &str) -> DbResult<bool>;

    /// Column names of `table`
    fn column_names(&self, table: &str) -> DbResult<Vec<String>>;

    /// DDL creating the table under its quoted name
    fn create_table_sql(&self, quoted_table: &str) -> String;

    /// DDL adding an upgradeable column
    fn add_column_sql(&self, quoted_table: &str, column: LogColumn) -> String;

    /// Run a DDL statement
    fn run_ddl(&self, sql: &str) -> DbResult<()>;
}

/// Create the schema table, or add any columns an older table is missing.
///
/// Every failure is reported as [`DbError::SchemaUpgradeError`].
pub(crate) fn ensure_schema_table(
    dialect: &impl SchemaDialect,
    table: &str,
    quoted_table: &str,
) -> DbResult<()> {
    let upgrade_err = |e: DbError| DbError::SchemaUpgradeError {
        table: table.to_string(),
        message: e.to_string(),
    };

    if !dialect.table_exists(table).map_err(upgrade_err)? {
        log::debug!("Creating schema table {table}");
        return dialect
            .run_ddl(&dialect.create_table_sql(quoted_table))
            .map_err(upgrade_err);
    }

    let existing = dialect.column_names(table).map_err(upgrade_err)?;
    for column in missing_columns(&existing) {
        log::info!("Upgrading schema table {table}: adding column {}", column.name());
        dialect
            .run_ddl(&dialect.add_column_sql(quoted_table, column))
            .map_err(upgrade_err)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "schema_log_test.rs"]
mod tests;

//! In-memory adapter for tests.
//!
//! [`RecordingAdapter`] logs every call into a shared [`CallLog`] that tests
//! keep a handle to after the adapter is boxed and handed away.

use crate::error::{DbError, DbResult};
use crate::schema_log::MigrationRecord;
use crate::traits::Adapter;
use crate::value::{QueryResult, Row, Value};
use chrono::NaiveDateTime;
use sl_core::{AdapterOptions, Output, SharedOutput, VersionOrder};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// One recorded adapter call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    Disconnect,
    Execute(String),
    ExecuteWithParams(String, Vec<Value>),
    Query(String),
    Insert { table: String, row: Row },
    BulkInsert { table: String, rows: Vec<Row> },
    HasTable(String),
    HasColumn(String, String),
    Begin,
    Commit,
    Rollback,
    Migrated { version: i64, name: String },
}

/// Shared, append-only call log
pub type CallLog = Rc<RefCell<Vec<Call>>>;

/// Shared schema log contents
pub type RecordLog = Rc<RefCell<Vec<MigrationRecord>>>;

/// Fake adapter that records calls instead of touching a database
pub struct RecordingAdapter {
    options: AdapterOptions,
    output: SharedOutput,
    calls: CallLog,
    records: RecordLog,
    connected: bool,
    transactions: bool,
    tables: HashSet<String>,
    failures: Vec<(String, String)>,
    results: HashMap<String, QueryResult>,
}

impl RecordingAdapter {
    pub fn new(options: AdapterOptions, output: SharedOutput) -> Self {
        Self {
            options,
            output,
            calls: Rc::new(RefCell::new(Vec::new())),
            records: Rc::new(RefCell::new(Vec::new())),
            connected: false,
            transactions: true,
            tables: HashSet::new(),
            failures: Vec::new(),
            results: HashMap::new(),
        }
    }

    /// Whether the fake claims transactional DDL support
    pub fn with_transactions(mut self, supported: bool) -> Self {
        self.transactions = supported;
        self
    }

    /// Report `table` as existing
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.tables.insert(table.into());
        self
    }

    /// Fail any executed statement containing `pattern`
    pub fn fail_on(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.push((pattern.into(), message.into()));
        self
    }

    /// Canned result for an exact query string
    pub fn with_result(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.results.insert(sql.into(), result);
        self
    }

    /// Pre-populate the schema log
    pub fn with_records(self, records: Vec<MigrationRecord>) -> Self {
        *self.records.borrow_mut() = records;
        self
    }

    /// Handle to the call log
    pub fn calls(&self) -> CallLog {
        Rc::clone(&self.calls)
    }

    /// Handle to the schema log contents
    pub fn records(&self) -> RecordLog {
        Rc::clone(&self.records)
    }

    /// Boxed adapter plus handles to its logs
    pub fn boxed(self) -> (Box<dyn Adapter>, CallLog, RecordLog) {
        let calls = self.calls();
        let records = self.records();
        (Box::new(self), calls, records)
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Adapter for RecordingAdapter {
    fn adapter_type(&self) -> &str {
        "recording"
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }

    fn output(&self) -> SharedOutput {
        self.output.clone()
    }

    fn connect(&mut self) -> DbResult<()> {
        if !self.connected {
            self.record(Call::Connect);
            self.connected = true;
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.connected {
            self.record(Call::Disconnect);
            self.connected = false;
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn execute(&mut self, sql: &str) -> DbResult<usize> {
        self.record(Call::Execute(sql.to_string()));
        if let Some((_, message)) = self.failures.iter().find(|(p, _)| sql.contains(p.as_str())) {
            return Err(DbError::ExecutionError(message.clone()));
        }
        if self.options.dry_run {
            self.output.writeln(sql);
        }
        Ok(0)
    }

    fn execute_with_params(&mut self, sql: &str, params: &[Value]) -> DbResult<usize> {
        self.record(Call::ExecuteWithParams(sql.to_string(), params.to_vec()));
        if let Some((_, message)) = self.failures.iter().find(|(p, _)| sql.contains(p.as_str())) {
            return Err(DbError::ExecutionError(message.clone()));
        }
        Ok(0)
    }

    fn query(&mut self, sql: &str) -> DbResult<QueryResult> {
        self.record(Call::Query(sql.to_string()));
        Ok(self.results.get(sql).cloned().unwrap_or_default())
    }

    fn insert(&mut self, table: &str, row: &Row) -> DbResult<()> {
        self.record(Call::Insert {
            table: table.to_string(),
            row: row.clone(),
        });
        Ok(())
    }

    fn bulk_insert(&mut self, table: &str, rows: &[Row]) -> DbResult<()> {
        self.record(Call::BulkInsert {
            table: table.to_string(),
            rows: rows.to_vec(),
        });
        Ok(())
    }

    fn has_table(&mut self, table: &str) -> DbResult<bool> {
        self.record(Call::HasTable(table.to_string()));
        Ok(self.tables.contains(table))
    }

    fn has_column(&mut self, table: &str, column: &str) -> DbResult<bool> {
        self.record(Call::HasColumn(table.to_string(), column.to_string()));
        Ok(false)
    }

    fn quote_column_name(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn has_transactions(&self) -> bool {
        self.transactions
    }

    fn begin_transaction(&mut self) -> DbResult<()> {
        self.record(Call::Begin);
        Ok(())
    }

    fn commit_transaction(&mut self) -> DbResult<()> {
        self.record(Call::Commit);
        Ok(())
    }

    fn rollback_transaction(&mut self) -> DbResult<()> {
        self.record(Call::Rollback);
        Ok(())
    }

    fn migrated(
        &mut self,
        version: i64,
        name: &str,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> DbResult<()> {
        self.record(Call::Migrated {
            version,
            name: name.to_string(),
        });
        if !self.options.dry_run {
            self.records
                .borrow_mut()
                .push(MigrationRecord::new(version, name, start_time, end_time));
        }
        Ok(())
    }

    fn get_version_log(&mut self) -> DbResult<Vec<MigrationRecord>> {
        let mut records = self.records.borrow().clone();
        match self.options.version_order {
            VersionOrder::CreationTime => records.sort_by_key(|r| r.version),
            VersionOrder::ExecutionTime => records.sort_by_key(|r| (r.start_time, r.version)),
        }
        Ok(records)
    }
}

use super::*;
use crate::value::row;
use chrono::{NaiveDate, NaiveDateTime};
use sl_core::{BufferedOutput, NullOutput, VersionOrder};
use std::rc::Rc;

fn ts(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2012, 1, day)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn memory_options() -> AdapterOptions {
    AdapterOptions::new(ADAPTER_TYPE).with_path(MEMORY_PATH)
}

#[test]
fn test_connect_creates_schema_table() {
    let mut adapter = SqliteAdapter::in_memory(NullOutput::shared()).unwrap();
    assert!(adapter.has_table("phinxlog").unwrap());
    assert!(adapter.has_column("phinxlog", "breakpoint").unwrap());
    assert!(adapter.has_column("phinxlog", "MIGRATION_NAME").unwrap());
    assert!(!adapter.has_column("phinxlog", "checksum").unwrap());
}

#[test]
fn test_legacy_table_gains_columns() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE `phinxlog` (`version` BIGINT NOT NULL PRIMARY KEY, `start_time` TIMESTAMP, `end_time` TIMESTAMP);
         INSERT INTO `phinxlog` VALUES (20120111235330, '2012-01-11 23:53:36', '2012-01-11 23:53:37');",
    )
    .unwrap();

    let mut adapter =
        SqliteAdapter::with_connection(conn, memory_options(), NullOutput::shared()).unwrap();
    let log = adapter.get_version_log().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].version, 20120111235330);
    assert_eq!(log[0].migration_name, None);
    assert_eq!(log[0].start_time, Some(ts(11, 23, 53, 36)));
    assert!(!log[0].breakpoint);
}

#[test]
fn test_upgrade_is_idempotent_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.sqlite3");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE `phinxlog` (`version` BIGINT NOT NULL PRIMARY KEY)")
            .unwrap();
    }
    let options = AdapterOptions::new(ADAPTER_TYPE).with_path(path.to_string_lossy());

    let mut first = SqliteAdapter::new(options.clone(), NullOutput::shared());
    first.connect().unwrap();
    first.disconnect();

    let mut second = SqliteAdapter::new(options, NullOutput::shared());
    second.connect().unwrap();
    let columns = column_names(second.connection().unwrap(), "phinxlog").unwrap();
    assert_eq!(columns, vec!["version", "migration_name", "breakpoint"]);
}

#[test]
fn test_timestamps_stored_as_text() {
    let mut adapter = SqliteAdapter::in_memory(NullOutput::shared()).unwrap();
    adapter
        .migrated(20120111235330, "CreateUsers", ts(11, 23, 53, 36), ts(11, 23, 53, 37))
        .unwrap();
    let raw = adapter
        .fetch_row("SELECT start_time, breakpoint FROM phinxlog")
        .unwrap()
        .unwrap();
    assert_eq!(raw["start_time"], Value::from("2012-01-11 23:53:36"));
    assert_eq!(raw["breakpoint"], Value::Int(0));

    let log = adapter.get_version_log().unwrap();
    assert_eq!(log[0].end_time, Some(ts(11, 23, 53, 37)));
}

#[test]
fn test_version_order() {
    for (order, expected) in [
        (VersionOrder::CreationTime, vec![20120111235330, 20120116183504]),
        (VersionOrder::ExecutionTime, vec![20120116183504, 20120111235330]),
    ] {
        let options = memory_options().with_version_order(order);
        let mut adapter = SqliteAdapter::new(options, NullOutput::shared());
        adapter
            .migrated(20120116183504, "B", ts(16, 18, 35, 40), ts(16, 18, 35, 41))
            .unwrap();
        adapter
            .migrated(20120111235330, "A", ts(20, 23, 53, 36), ts(20, 23, 53, 37))
            .unwrap();
        assert_eq!(adapter.get_versions().unwrap(), expected, "{order}");
    }
}

#[test]
fn test_bulk_insert_and_fetch_all() {
    let mut adapter = SqliteAdapter::in_memory(NullOutput::shared()).unwrap();
    adapter
        .execute("CREATE TABLE `table1` (`column1` TEXT, `column2` INTEGER)")
        .unwrap();
    adapter
        .bulk_insert(
            "table1",
            &[
                row([("column1", Value::from("value1")), ("column2", Value::from(1))]),
                row([("column1", Value::from("value2")), ("column2", Value::from(2))]),
            ],
        )
        .unwrap();
    let rows = adapter
        .fetch_all("SELECT * FROM `table1` ORDER BY `column2`")
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["column1"], Value::from("value1"));
    assert_eq!(rows[1]["column2"], Value::Int(2));
}

#[test]
fn test_query_columns_survive_empty_results() {
    let mut adapter = SqliteAdapter::in_memory(NullOutput::shared()).unwrap();
    let result = adapter.query("SELECT version, migration_name FROM phinxlog").unwrap();
    assert!(result.is_empty());
    assert_eq!(result.columns, vec!["version", "migration_name"]);
}

#[test]
fn test_dry_run_insert_is_reported() {
    let output = Rc::new(BufferedOutput::new());
    let mut adapter = SqliteAdapter::new(memory_options().with_dry_run(true), output.clone());
    adapter
        .insert(
            "users",
            &row([("name", Value::from("Bob")), ("admin", Value::from(false))]),
        )
        .unwrap();
    assert!(!adapter.is_connected());
    assert_eq!(
        output.contents(),
        "INSERT INTO `users` (`admin`, `name`) VALUES (?, ?); -- [FALSE, 'Bob']\n"
    );
}

#[test]
fn test_quoting_doubles_backticks() {
    let adapter = SqliteAdapter::new(memory_options(), NullOutput::shared());
    assert_eq!(adapter.quote_column_name("we`ird"), "`we``ird`");
    assert_eq!(adapter.quote_table_name("main.users"), "`main`.`users`");
}

#[test]
fn test_transaction_rollback_discards_ddl() {
    let mut adapter = SqliteAdapter::in_memory(NullOutput::shared()).unwrap();
    adapter.begin_transaction().unwrap();
    adapter.execute("CREATE TABLE scratch (id INTEGER)").unwrap();
    adapter.rollback_transaction().unwrap();
    assert!(!adapter.has_table("scratch").unwrap());
}

#[test]
fn test_syntax_error_surfaces_as_execution_error() {
    let mut adapter = SqliteAdapter::in_memory(NullOutput::shared()).unwrap();
    assert!(matches!(
        adapter.execute("CREAT TABLE nope (id INTEGER)"),
        Err(DbError::ExecutionError(_))
    ));
}

#[test]
fn test_execute_with_params_binds_values() {
    let mut adapter = SqliteAdapter::in_memory(NullOutput::shared()).unwrap();
    adapter
        .execute("CREATE TABLE users (id INTEGER, name TEXT)")
        .unwrap();
    adapter
        .execute_with_params(
            "INSERT INTO users VALUES (?, ?)",
            &[Value::from(1), Value::from("Robert'); DROP TABLE users;--")],
        )
        .unwrap();

    assert!(adapter.has_table("users").unwrap());
    let row = adapter.fetch_row("SELECT name FROM users").unwrap().unwrap();
    assert_eq!(row["name"], Value::from("Robert'); DROP TABLE users;--"));
}

#[test]
fn test_execute_discards_returned_rows() {
    let mut adapter = SqliteAdapter::in_memory(NullOutput::shared()).unwrap();
    assert_eq!(adapter.execute("PRAGMA journal_mode=WAL").unwrap(), 0);
    assert_eq!(adapter.execute("SELECT 1").unwrap(), 0);
    adapter.execute("CREATE TABLE t (id INTEGER)").unwrap();
    assert_eq!(adapter.execute("INSERT INTO t VALUES (1), (2)").unwrap(), 2);
}

use super::*;
use sl_core::{AdapterOptions, NullOutput};
use sl_db::testing::{Call, RecordingAdapter};
use sl_db::{row, Value};

fn recording() -> RecordingAdapter {
    RecordingAdapter::new(AdapterOptions::new("recording"), NullOutput::shared())
}

#[test]
fn test_single_row_insert_is_one_bulk_insert() {
    let mut adapter = recording();
    let calls = adapter.calls();
    let mut ctx = MigrationContext::new(&mut adapter, 1);

    let r = row([("column1", Value::from("value1")), ("column2", Value::from(1))]);
    ctx.insert("table1", r.clone()).unwrap();

    assert_eq!(
        *calls.borrow(),
        vec![Call::BulkInsert {
            table: "table1".to_string(),
            rows: vec![r]
        }]
    );
}

#[test]
fn test_uniform_batch_is_one_bulk_insert() {
    let mut adapter = recording();
    let calls = adapter.calls();
    let mut ctx = MigrationContext::new(&mut adapter, 1);

    let rows = vec![
        row([("column1", Value::from("value1")), ("column2", Value::from(1))]),
        row([("column2", Value::from(2)), ("column1", Value::from("value2"))]),
    ];
    ctx.insert("table1", rows.clone()).unwrap();

    assert_eq!(
        *calls.borrow(),
        vec![Call::BulkInsert {
            table: "table1".to_string(),
            rows
        }]
    );
}

#[test]
fn test_mixed_batch_is_rejected_before_reaching_the_adapter() {
    let mut adapter = recording();
    let calls = adapter.calls();
    let mut ctx = MigrationContext::new(&mut adapter, 1);

    let rows = vec![
        row([("column1", Value::from("value1"))]),
        row([("column1", Value::from("value2")), ("column2", Value::from(2))]),
    ];
    let err = ctx.insert("table1", rows).unwrap_err();

    match &err {
        MigrateError::MixedInsertColumns {
            table,
            row,
            expected,
            found,
        } => {
            assert_eq!(table, "table1");
            assert_eq!(*row, 2);
            assert_eq!(expected, "column1");
            assert_eq!(found, "column1, column2");
        }
        other => panic!("expected MixedInsertColumns, got {other:?}"),
    }
    assert!(err.to_string().contains("mixed column keys"));
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_context_forwards_queries() {
    let mut adapter = recording().with_table("users");
    let calls = adapter.calls();
    let mut ctx = MigrationContext::new(&mut adapter, 20120111235330);

    assert_eq!(ctx.version(), 20120111235330);
    ctx.execute("CREATE TABLE t (id INTEGER)").unwrap();
    assert!(ctx.has_table("users").unwrap());
    assert!(ctx.fetch_row("SELECT 1").unwrap().is_none());

    assert_eq!(
        *calls.borrow(),
        vec![
            Call::Execute("CREATE TABLE t (id INTEGER)".to_string()),
            Call::HasTable("users".to_string()),
            Call::Query("SELECT 1".to_string()),
        ]
    );
}

#[test]
fn test_adapter_errors_pass_through() {
    let mut adapter = recording().fail_on("DROP", "permission denied");
    let mut ctx = MigrationContext::new(&mut adapter, 1);
    match ctx.execute("DROP TABLE users") {
        Err(MigrateError::Db(sl_db::DbError::ExecutionError(message))) => {
            assert_eq!(message, "permission denied")
        }
        other => panic!("expected a passed-through DbError, got {other:?}"),
    }
}

#[test]
fn test_prepare_and_execute_binds_instead_of_interpolating() {
    let mut adapter = recording();
    let calls = adapter.calls();
    let mut ctx = MigrationContext::new(&mut adapter, 1);

    ctx.prepare_and_execute(
        "UPDATE users SET name = ? WHERE id = ?",
        &[Value::from("O'Hara"), Value::from(7)],
    )
    .unwrap();

    assert_eq!(
        *calls.borrow(),
        vec![Call::ExecuteWithParams(
            "UPDATE users SET name = ? WHERE id = ?".to_string(),
            vec![Value::from("O'Hara"), Value::from(7)]
        )]
    );
}

//! Dump imports against real engines

use sl_core::{AdapterOptions, BufferedOutput, NullOutput};
use sl_db::{Adapter, DbError, DuckDbAdapter, SqliteAdapter};
use sl_import::{ImportError, SqlDumpImporter};
use std::io::Write;
use std::rc::Rc;

const DUMP: &str = "\
-- schema
CREATE TABLE customers (
  id INTEGER PRIMARY KEY,
  name VARCHAR
);

-- data
INSERT INTO customers VALUES (1, 'Ada');
INSERT INTO customers VALUES (2, 'Grace; Hopper');
INSERT INTO customers VALUES (3, 'Edsger');
";

fn dump_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn customer_names(adapter: &mut dyn Adapter) -> Vec<String> {
    adapter
        .fetch_all("SELECT name FROM customers ORDER BY id")
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn import_into_duckdb() {
    let file = dump_file(DUMP);
    let output = Rc::new(BufferedOutput::new());
    let mut adapter = DuckDbAdapter::in_memory(output.clone()).unwrap();

    let summary = SqlDumpImporter::new(&mut adapter, output.clone())
        .import(file.path())
        .unwrap();

    assert_eq!(summary.statements, 4);
    assert_eq!(customer_names(&mut adapter), vec!["Ada", "Grace; Hopper", "Edsger"]);
    assert!(output.contents().ends_with(&format!(
        "4 statements executed from {}\n",
        file.path().display()
    )));
}

#[test]
fn import_into_sqlite_stops_at_failure() {
    let dump = format!("{DUMP}INSERT INTO customers VALUES (1, 'Duplicate');\nINSERT INTO customers VALUES (9, 'Never');\n");
    let file = dump_file(&dump);
    let output = Rc::new(BufferedOutput::new());
    let mut adapter = SqliteAdapter::new(
        AdapterOptions::new("sqlite").with_path(":memory:"),
        NullOutput::shared(),
    );

    let err = SqlDumpImporter::new(&mut adapter, output.clone())
        .import(file.path())
        .unwrap_err();

    assert!(matches!(
        err,
        ImportError::Execution {
            index: 5,
            source: DbError::ExecutionError(_)
        }
    ));
    assert!(output
        .contents()
        .contains("failing statement #5:\nINSERT INTO customers VALUES (1, 'Duplicate')\n"));
    assert_eq!(customer_names(&mut adapter), vec!["Ada", "Grace; Hopper", "Edsger"]);
}

//! SQL text shared by the engine adapters.

use crate::error::{DbError, DbResult};
use crate::value::{Row, Value};

/// Column names of the first row, after checking every row shares them.
///
/// Returns `None` for an empty batch.
pub(crate) fn batch_columns(table: &str, rows: &[Row]) -> DbResult<Option<Vec<String>>> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    let expected: Vec<&String> = first.keys().collect();
    for (idx, row) in rows.iter().enumerate().skip(1) {
        if !row.keys().eq(expected.iter().copied()) {
            return Err(DbError::MismatchedBulkColumns {
                table: table.to_string(),
                row: idx + 1,
                expected: join_keys(first),
                found: join_keys(row),
            });
        }
    }
    Ok(Some(expected.into_iter().cloned().collect()))
}

fn join_keys(row: &Row) -> String {
    row.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// `INSERT INTO t (a, b) VALUES (?, ?), (?, ?)` with one placeholder group
/// per row
pub(crate) fn insert_sql(
    quoted_table: &str,
    quoted_columns: &[String],
    row_count: usize,
) -> String {
    let group = format!("({})", vec!["?"; quoted_columns.len()].join(", "));
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quoted_table,
        quoted_columns.join(", "),
        vec![group; row_count].join(", ")
    )
}

/// Bound values of a batch, row by row in column order
pub(crate) fn batch_values(rows: &[Row]) -> Vec<&Value> {
    rows.iter().flat_map(|row| row.values()).collect()
}

/// Dry-run rendering of a parameterized statement
pub(crate) fn render_dry_run(sql: &str, values: &[&Value]) -> String {
    let rendered: Vec<String> = values.iter().map(|v| v.to_sql_literal()).collect();
    format!("{}; -- [{}]", sql, rendered.join(", "))
}

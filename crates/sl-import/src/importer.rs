//! SQL dump importer

use crate::error::{ImportError, ImportResult};
use crate::stream::{StatementStream, DEFAULT_MAX_STATEMENT_LENGTH};
use sl_core::{Output, SharedOutput};
use sl_db::Adapter;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Statements between progress dots
const PROGRESS_INTERVAL: usize = 20;

/// Outcome of a successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Statements executed
    pub statements: usize,
    pub file: PathBuf,
}

/// Executes a dump file one statement at a time against an adapter
pub struct SqlDumpImporter<'a> {
    adapter: &'a mut dyn Adapter,
    output: SharedOutput,
}

impl<'a> SqlDumpImporter<'a> {
    pub fn new(adapter: &'a mut dyn Adapter, output: SharedOutput) -> Self {
        Self { adapter, output }
    }

    /// Import `path` with the default statement length limit
    pub fn import(&mut self, path: impl AsRef<Path>) -> ImportResult<ImportSummary> {
        self.import_with_limit(path, DEFAULT_MAX_STATEMENT_LENGTH)
    }

    /// Import `path`, treating any statement that cannot end with its `;\n`
    /// inside `max_statement_length` bytes as truncated
    pub fn import_with_limit(
        &mut self,
        path: impl AsRef<Path>,
        max_statement_length: usize,
    ) -> ImportResult<ImportSummary> {
        let path = path.as_ref();
        let file = open_regular(path)?;
        let stream = StatementStream::with_max_length(BufReader::new(file), max_statement_length)?
            .with_path(path);
        log::info!("Importing {}", path.display());

        let mut count = 0;
        for statement in stream {
            let statement = statement?;
            if let Err(source) = self.adapter.execute(&statement.sql) {
                self.output.writeln(&format!(
                    "Failed importing {} - failing statement #{}:",
                    path.display(),
                    statement.index
                ));
                self.output.writeln(&statement.sql);
                return Err(ImportError::Execution {
                    index: statement.index,
                    source,
                });
            }

            count = statement.index;
            if count % PROGRESS_INTERVAL == 0 {
                self.output.write(".");
                log::debug!("Imported {count} statements from {}", path.display());
            }
        }

        if count == 0 {
            return Err(ImportError::EmptyFile {
                path: path.to_path_buf(),
            });
        }

        self.output.write("\n");
        self.output.writeln(&format!(
            "{count} statements executed from {}",
            path.display()
        ));
        log::info!("Imported {count} statements from {}", path.display());

        Ok(ImportSummary {
            statements: count,
            file: path.to_path_buf(),
        })
    }
}

/// Open `path` for reading, refusing directories and other non-files
fn open_regular(path: &Path) -> ImportResult<File> {
    let open_error = |source| ImportError::FileOpen {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(open_error)?;
    let metadata = file.metadata().map_err(open_error)?;
    if !metadata.is_file() {
        return Err(open_error(std::io::Error::other("not a regular file")));
    }
    Ok(file)
}

#[cfg(test)]
#[path = "importer_test.rs"]
mod tests;

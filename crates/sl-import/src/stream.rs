//! Streaming statement splitter
//!
//! A statement ends at the two-byte delimiter `;\n`, which is not part of the
//! yielded text. Everything else is kept verbatim, so comments and blank lines
//! travel with the statement that follows them. A chunk that reaches the
//! length limit without a delimiter is reported as truncated, never split.

use crate::error::{ImportError, ImportResult};
use std::io::{BufRead, ErrorKind};
use std::path::PathBuf;

/// Default upper bound on one statement, in bytes
pub const DEFAULT_MAX_STATEMENT_LENGTH: usize = 2_000_000;

/// One statement read from a dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// 1-based position among non-blank statements
    pub index: usize,
    pub sql: String,
}

/// Single-pass iterator over the statements of a reader
#[derive(Debug)]
pub struct StatementStream<R> {
    reader: R,
    max_length: usize,
    /// Statements yielded so far
    yielded: usize,
    buf: Vec<u8>,
    done: bool,
    /// Named in read errors
    path: PathBuf,
}

/// What one scan of the reader produced
enum Chunk {
    Delimited(Vec<u8>),
    Eof(Vec<u8>),
    Truncated(Vec<u8>),
}

impl<R: BufRead> StatementStream<R> {
    /// Stream with [`DEFAULT_MAX_STATEMENT_LENGTH`]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            max_length: DEFAULT_MAX_STATEMENT_LENGTH,
            yielded: 0,
            buf: Vec::new(),
            done: false,
            path: PathBuf::from("<input>"),
        }
    }

    /// Stream with a custom length limit. Zero is rejected.
    pub fn with_max_length(reader: R, max_length: usize) -> ImportResult<Self> {
        if max_length == 0 {
            return Err(ImportError::Config(
                "max_statement_length must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_length,
            ..Self::new(reader)
        })
    }

    /// Name the source in read errors
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Read until a delimiter, the length limit, or end of input
    fn next_chunk(&mut self) -> std::io::Result<Chunk> {
        loop {
            let available = match self.reader.fill_buf() {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(Chunk::Eof(std::mem::take(&mut self.buf)));
            }

            let mut used = 0;
            let mut found = None;
            for &byte in available {
                used += 1;
                if byte == b'\n' && self.buf.last() == Some(&b';') {
                    self.buf.pop();
                    found = Some(Chunk::Delimited(std::mem::take(&mut self.buf)));
                    break;
                }
                self.buf.push(byte);
                // the whole delimiter has to fit inside the limit too
                if self.buf.len() >= self.max_length {
                    found = Some(Chunk::Truncated(std::mem::take(&mut self.buf)));
                    break;
                }
            }
            self.reader.consume(used);

            if let Some(chunk) = found {
                return Ok(chunk);
            }
        }
    }

    fn decode(&self, index: usize, bytes: Vec<u8>) -> ImportResult<String> {
        String::from_utf8(bytes).map_err(|_| ImportError::InvalidUtf8 { index })
    }
}

impl<R: BufRead> Iterator for StatementStream<R> {
    type Item = ImportResult<Statement>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let index = self.yielded + 1;
            let chunk = match self.next_chunk() {
                Ok(chunk) => chunk,
                Err(source) => {
                    self.done = true;
                    return Some(Err(ImportError::Read {
                        path: self.path.clone(),
                        index,
                        source,
                    }));
                }
            };

            let bytes = match chunk {
                Chunk::Delimited(bytes) => bytes,
                Chunk::Eof(bytes) => {
                    self.done = true;
                    bytes
                }
                Chunk::Truncated(bytes) => {
                    self.done = true;
                    return Some(Err(ImportError::TruncatedStatement {
                        index,
                        limit: self.max_length,
                        statement: String::from_utf8_lossy(&bytes).into_owned(),
                    }));
                }
            };

            let sql = match self.decode(index, bytes) {
                Ok(sql) => sql,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            if sql.trim().is_empty() {
                continue;
            }

            self.yielded = index;
            return Some(Ok(Statement { index, sql }));
        }
        None
    }
}

impl<R: BufRead> std::iter::FusedIterator for StatementStream<R> {}

#[cfg(test)]
#[path = "stream_test.rs"]
mod tests;

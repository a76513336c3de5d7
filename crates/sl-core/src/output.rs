//! Write-only output sink for progress, timing, and diagnostic text.
//!
//! The sink is shared between an environment, its adapter chain, and the dump
//! importer, so implementations take `&self` and use interior mutability.
//! Everything runs on one thread; [`SharedOutput`] is an `Rc`.

use std::cell::{Cell, RefCell};
use std::io::Write;
use std::rc::Rc;

/// Output verbosity, ordered from least to most chatty
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Nothing beyond errors
    Quiet,
    /// Progress and summaries
    #[default]
    Normal,
    /// Adds per-command timing
    Verbose,
    /// Extra detail
    VeryVerbose,
    /// Everything
    Debug,
}

/// A write-only text stream. The core never reads back from it.
pub trait Output {
    /// Write text without a trailing newline
    fn write(&self, text: &str);

    /// Current verbosity
    fn verbosity(&self) -> Verbosity;

    /// Write text followed by a newline
    fn writeln(&self, text: &str) {
        self.write(text);
        self.write("\n");
    }

    /// Returns `true` at [`Verbosity::Verbose`] or above
    fn is_verbose(&self) -> bool {
        self.verbosity() >= Verbosity::Verbose
    }
}

/// Shared handle to an output sink
pub type SharedOutput = Rc<dyn Output>;

/// Writes to standard output
#[derive(Debug, Default)]
pub struct ConsoleOutput {
    verbosity: Verbosity,
}

impl ConsoleOutput {
    /// Create a console sink at the given verbosity
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Create a shared console sink
    pub fn shared(verbosity: Verbosity) -> SharedOutput {
        Rc::new(Self::new(verbosity))
    }
}

impl Output for ConsoleOutput {
    fn write(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
            log::warn!("Failed to write to stdout: {e}");
        }
    }

    fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}

/// Captures everything written, for tests and embedders
#[derive(Debug, Default)]
pub struct BufferedOutput {
    buffer: RefCell<String>,
    verbosity: Cell<Verbosity>,
}

impl BufferedOutput {
    /// Create an empty buffer at normal verbosity
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer at the given verbosity
    pub fn with_verbosity(verbosity: Verbosity) -> Self {
        Self {
            buffer: RefCell::new(String::new()),
            verbosity: Cell::new(verbosity),
        }
    }

    /// Copy of everything written so far
    pub fn contents(&self) -> String {
        self.buffer.borrow().clone()
    }

    /// Return everything written so far and clear the buffer
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.buffer.borrow_mut())
    }

    /// Change the verbosity
    pub fn set_verbosity(&self, verbosity: Verbosity) {
        self.verbosity.set(verbosity);
    }
}

impl Output for BufferedOutput {
    fn write(&self, text: &str) {
        self.buffer.borrow_mut().push_str(text);
    }

    fn verbosity(&self) -> Verbosity {
        self.verbosity.get()
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl NullOutput {
    /// Create a shared null sink
    pub fn shared() -> SharedOutput {
        Rc::new(NullOutput)
    }
}

impl Output for NullOutput {
    fn write(&self, _text: &str) {}

    fn verbosity(&self) -> Verbosity {
        Verbosity::Quiet
    }
}

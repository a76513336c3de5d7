//! sl-core - Core library for Shiplog
//!
//! This crate provides the configuration types handed to adapters and
//! environments, the write-only output sink used for progress and
//! diagnostics, and the core error type shared by the other crates.

pub mod config;
pub mod error;
pub mod output;
pub(crate) mod serde_helpers;

pub use config::{AdapterOptions, Config, EnvironmentConfig, VersionOrder};
pub use error::{CoreError, CoreResult};
pub use output::{BufferedOutput, ConsoleOutput, NullOutput, Output, SharedOutput, Verbosity};

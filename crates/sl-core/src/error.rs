//! Error types for sl-core

use thiserror::Error;

/// Core error type for Shiplog
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Invalid configuration value
    #[error("[C001] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C002: Named environment is not configured
    #[error("[C002] The environment \"{name}\" does not exist")]
    EnvironmentNotFound { name: String },

    /// C003: Environment has no adapter configured
    #[error("[C003] No adapter was specified for environment: {name}")]
    MissingAdapter { name: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

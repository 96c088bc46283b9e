// src/utils/errors.rs
//! Error types for the shim
//!
//! Errors here never cross the interposed FFI boundary: every failure in the
//! capture layer degrades to "no logging" before it can reach the
//! application. The taxonomy serves the writer and diagnostics seams and
//! their tests.

use thiserror::Error;

/// Result alias used throughout the shim.
pub type Result<T> = std::result::Result<T, ShimError>;

/// Shim-internal errors.
#[derive(Error, Debug)]
pub enum ShimError {
    /// A configuration value is unusable (e.g. a path with an interior NUL).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The key-log file could not be opened.
    #[error("Key log writer failed: {0}")]
    WriterFailed(String),

    /// The diagnostics subscriber could not be installed.
    #[error("Diagnostics init failed: {0}")]
    DiagnosticsFailed(String),
}

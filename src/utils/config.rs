// src/utils/config.rs
//! Environment configuration
//!
//! All configuration flows through the process environment, the only channel
//! available to a preloaded library:
//!
//! - `SSLKEYLOGFILE`: path of the key-log file. Absent means capture stays
//!   off for the process lifetime; this is the default state, not an error.
//! - `SSLKEYLOG_SHIM_DEBUG`: enables stderr diagnostics.

use std::env;
use std::path::PathBuf;

/// Names the key-log output file.
pub const KEYLOG_FILE_ENV: &str = "SSLKEYLOGFILE";

/// Enables stderr diagnostics; the value may be a filter directive set
/// (e.g. `sslkeylog=trace`).
pub const DIAGNOSTICS_ENV: &str = "SSLKEYLOG_SHIM_DEBUG";

/// Shim configuration, read from the environment once at initialization.
#[derive(Debug, Clone, Default)]
pub struct ShimConfig {
    /// Key-log output path; `None` disables capture entirely.
    pub keylog_path: Option<PathBuf>,

    /// Diagnostics request; `None` keeps the shim silent.
    pub diagnostics: Option<String>,
}

impl ShimConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        let keylog_path = env::var_os(KEYLOG_FILE_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let diagnostics = env::var(DIAGNOSTICS_ENV)
            .ok()
            .filter(|value| !value.is_empty());

        Self {
            keylog_path,
            diagnostics,
        }
    }

    /// Whether a key-log path is configured.
    pub fn capture_requested(&self) -> bool {
        self.keylog_path.is_some()
    }
}

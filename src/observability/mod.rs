// src/observability/mod.rs
//! Diagnostics for the shim
//!
//! A preloaded library must stay silent on the host application's stderr by
//! default. `tracing` events are emitted throughout the crate, but a
//! subscriber is only installed when diagnostics are requested via
//! `SSLKEYLOG_SHIM_DEBUG`; without one the macros are disabled no-ops and
//! cost nothing on the handshake path.

use crate::utils::config::ShimConfig;
use crate::utils::errors::{Result, ShimError};
use tracing_subscriber::EnvFilter;

/// Filter applied when the env value is a bare on-switch rather than a
/// directive set.
const DEFAULT_DIRECTIVES: &str = "debug";

/// Install the stderr subscriber when diagnostics are requested.
///
/// `SSLKEYLOG_SHIM_DEBUG=1` enables `debug`-level output; a value that
/// parses as filter directives (e.g. `sslkeylog=trace`) is used as-is.
pub fn init_diagnostics(config: &ShimConfig) -> Result<()> {
    let Some(directives) = config.diagnostics.as_deref() else {
        return Ok(());
    };

    let filter = match directives {
        "1" | "true" | "on" => EnvFilter::new(DEFAULT_DIRECTIVES),
        other => EnvFilter::try_new(other).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| ShimError::DiagnosticsFailed(format!("Failed to install subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_diagnostics_is_a_noop() {
        let config = ShimConfig::default();
        assert!(init_diagnostics(&config).is_ok());
    }
}

// src/lib.rs
//! SSLKEYLOGFILE capture shim for OpenSSL-linked processes
//!
//! Loaded ahead of libssl (`LD_PRELOAD=libsslkeylog.so`), this library
//! interposes the handshake entry points, observes the session secrets the
//! real library derives, and appends them in the NSS key-log format to the
//! file named by `SSLKEYLOGFILE`, so passive tools (e.g. Wireshark) can
//! decrypt the captured traffic without the private key.
//!
//! # Architecture
//!
//! - **interception**: symbol resolution, capability detection, and the
//!   interposed `SSL_*` entry points
//! - **recording**: secret snapshots and the append-only key-log writer
//! - **observability**: env-gated stderr diagnostics
//! - **utils**: configuration and error types
//!
//! # Capture strategies
//!
//! On OpenSSL 1.1.1+ the shim registers libssl's own key-log callback,
//! which reports every derived secret across the full negotiated protocol
//! range, TLS 1.3 included. On OpenSSL 1.1.0, which has no such callback
//! (and speaks TLS 1.2 at most), the master key is diffed around each
//! handshake call instead. The strategy is detected once per process.

pub mod interception;
pub mod observability;
pub mod recording;
pub mod utils;

// Re-export commonly used types
pub use interception::{CaptureMode, OpenSslApi, ShimContext};
pub use recording::{ClientRandomSnapshot, KeyLogWriter, MasterKeySnapshot};
pub use utils::config::ShimConfig;
pub use utils::errors::{Result, ShimError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

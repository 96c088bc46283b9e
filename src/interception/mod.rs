// src/interception/mod.rs
//! Transparent interposition between the application and libssl
//!
//! This module owns everything between the application's `SSL_*` calls and
//! the real library:
//!
//! - **Resolver**: locates the real entry points past this preloaded object
//! - **OpenSSL**: the resolved entry-point table and capture-mode detection
//! - **Context**: process-wide one-time state and lifecycle
//! - **Hooks**: the interposed `SSL_*` definitions the application calls
//!
//! # Architecture
//!
//! ```text
//! Application ──SSL_new / SSL_connect / …──▶ Hooks ──▶ real libssl
//!                                              │
//!                                  snapshot diff / key-log callback
//!                                              ▼
//!                                        KeyLogWriter
//! ```

pub mod context;
pub mod hooks;
pub mod openssl;
pub mod resolver;

// Re-export commonly used types
pub use context::ShimContext;
pub use openssl::{CaptureMode, OpenSslApi};
pub use resolver::{DynamicLoader, SymbolSource};

// src/recording/mod.rs
//! Secret capture and key-log output
//!
//! This module turns observed handshake state into NSS key-log records:
//!
//! - **Extractor**: fixed-capacity snapshots of the client random and master
//!   key, with the change detection that suppresses resumed sessions
//! - **Writer**: the append-only key-log file, one atomic write per line

pub mod extractor;
pub mod writer;

// Re-export commonly used types
pub use extractor::{ClientRandomSnapshot, MasterKeySnapshot};
pub use writer::KeyLogWriter;

// src/interception/context.rs
//! Process-wide shim state and lifecycle
//!
//! All global state — the resolved entry-point table, the capture mode and
//! the key-log writer — lives in one context constructed behind a
//! concurrency-safe one-time gate and treated as immutable afterwards.
//! Concurrent first callers serialize on the gate; every caller observes
//! the fully initialized context.

use crate::interception::openssl::{CaptureMode, OpenSslApi};
use crate::interception::resolver::DynamicLoader;
use crate::observability;
use crate::recording::writer::KeyLogWriter;
use crate::utils::config::ShimConfig;
use once_cell::sync::OnceCell;
use tracing::debug;

static CONTEXT: OnceCell<ShimContext> = OnceCell::new();

/// Everything the hooks need, resolved once per process.
pub struct ShimContext {
    pub api: OpenSslApi,
    pub mode: CaptureMode,
    pub writer: KeyLogWriter,
}

impl ShimContext {
    /// One-time-gated accessor; initializes on first use from any hook.
    pub fn shared() -> &'static ShimContext {
        CONTEXT.get_or_init(ShimContext::initialize)
    }

    /// The context if it has been initialized, without triggering
    /// initialization. Used from the key-log callback, which can only fire
    /// after initialization registered it.
    pub fn current() -> Option<&'static ShimContext> {
        CONTEXT.get()
    }

    fn initialize() -> ShimContext {
        let config = ShimConfig::from_env();

        // Nothing can be logged before this; a failure here leaves the
        // macros disabled and capture fully functional.
        let _ = observability::init_diagnostics(&config);
        debug!("Initializing shim (capture requested: {})", config.capture_requested());

        let api = OpenSslApi::resolve(&DynamicLoader);
        let mode = CaptureMode::detect(&DynamicLoader);

        let writer = KeyLogWriter::open(config.keylog_path.as_deref());
        if writer.is_enabled() {
            // Close the key-log file exactly once at normal termination.
            unsafe {
                libc::atexit(shutdown_at_exit);
            }
        }

        ShimContext { api, mode, writer }
    }

    /// Idempotent shutdown: closes the key-log file if it is open.
    pub fn shutdown(&self) {
        self.writer.finalize();
    }
}

extern "C" fn shutdown_at_exit() {
    if let Some(context) = ShimContext::current() {
        context.shutdown();
    }
}

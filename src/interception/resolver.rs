// src/interception/resolver.rs
//! Runtime resolution of real library entry points
//!
//! This object is loaded ahead of libssl (via `LD_PRELOAD`), so its exported
//! symbols shadow the real ones. `dlsym(RTLD_NEXT, ...)` searches the
//! objects loaded *after* this one, which is exactly where the real libssl
//! sits. When that search comes up empty the default library name is loaded
//! explicitly and its exports searched as a fallback.

use libc::c_void;
use std::ffi::CStr;
use std::ptr::NonNull;
use tracing::{debug, error};

/// Shared-library name searched when RTLD_NEXT finds nothing.
const DEFAULT_LIBSSL: &CStr = c"libssl.so";

/// Source of real entry points.
///
/// `resolve` serves version-gated, optional symbols and never aborts.
/// `resolve_mandatory` serves symbols the shim cannot work without:
/// continuing with one missing would silently capture nothing against a
/// broken or absent libssl, so the process is aborted instead.
pub trait SymbolSource {
    /// Locate `name`, or `None` when no loaded provider exports it.
    fn resolve(&self, name: &CStr) -> Option<NonNull<c_void>>;

    /// Locate `name` or abort the process.
    fn resolve_mandatory(&self, name: &CStr) -> NonNull<c_void> {
        match self.resolve(name) {
            Some(symbol) => symbol,
            None => {
                error!("Mandatory symbol {:?} not found, aborting", name);
                std::process::abort();
            }
        }
    }
}

/// Resolver backed by the process's dynamic loader.
pub struct DynamicLoader;

impl SymbolSource for DynamicLoader {
    fn resolve(&self, name: &CStr) -> Option<NonNull<c_void>> {
        let symbol = unsafe { libc::dlsym(libc::RTLD_NEXT, name.as_ptr()) };
        if let Some(symbol) = NonNull::new(symbol) {
            return Some(symbol);
        }

        // RTLD_NEXT misses libssl when it is not yet in the search chain
        // behind us; load it by its default name and look there.
        let handle = unsafe { libc::dlopen(DEFAULT_LIBSSL.as_ptr(), libc::RTLD_LAZY) };
        if handle.is_null() {
            debug!(
                "Symbol {:?} not found and {:?} could not be loaded",
                name, DEFAULT_LIBSSL
            );
            return None;
        }
        let symbol = unsafe { libc::dlsym(handle, name.as_ptr()) };
        unsafe {
            libc::dlclose(handle);
        }
        NonNull::new(symbol)
    }
}

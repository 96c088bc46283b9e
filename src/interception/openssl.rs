// src/interception/openssl.rs
//! Resolved libssl entry points and capture capability detection
//!
//! The table of real entry points is resolved exactly once per process.
//! Mandatory entries abort on failure before any of them can be used;
//! the key-log callback registration only exists on OpenSSL 1.1.1+ and
//! resolves softly, which is what decides the capture strategy.

use crate::interception::resolver::SymbolSource;
use libc::{c_char, c_int, c_void};
use std::mem;
use tracing::info;

/// Opaque connection object (`SSL *`).
#[repr(C)]
#[allow(non_camel_case_types)]
pub struct SSL {
    _opaque: [u8; 0],
}

/// Opaque connection-factory context (`SSL_CTX *`).
#[repr(C)]
#[allow(non_camel_case_types)]
pub struct SSL_CTX {
    _opaque: [u8; 0],
}

/// Opaque session object (`SSL_SESSION *`).
#[repr(C)]
#[allow(non_camel_case_types)]
pub struct SSL_SESSION {
    _opaque: [u8; 0],
}

pub type SslNewFn = unsafe extern "C" fn(*mut SSL_CTX) -> *mut SSL;
pub type SslHandshakeFn = unsafe extern "C" fn(*mut SSL) -> c_int;
pub type SslGetClientRandomFn = unsafe extern "C" fn(*const SSL, *mut u8, usize) -> usize;
pub type SslSessionGetMasterKeyFn =
    unsafe extern "C" fn(*const SSL_SESSION, *mut u8, usize) -> usize;
pub type SslGetSessionFn = unsafe extern "C" fn(*const SSL) -> *mut SSL_SESSION;

/// Signature of the callback libssl invokes with one NSS-format line per
/// derived secret.
pub type KeylogCallbackFn = unsafe extern "C" fn(*const SSL, *const c_char);
pub type SslCtxSetKeylogCallbackFn = unsafe extern "C" fn(*mut SSL_CTX, KeylogCallbackFn);

/// Immutable table of real libssl entry points.
///
/// Either fully populated or the process aborted during resolution; after
/// construction it is read-only shared state.
pub struct OpenSslApi {
    pub ssl_new: SslNewFn,
    pub connect: SslHandshakeFn,
    pub do_handshake: SslHandshakeFn,
    pub accept: SslHandshakeFn,
    pub get_client_random: SslGetClientRandomFn,
    pub session_get_master_key: SslSessionGetMasterKeyFn,
    pub get_session: SslGetSessionFn,
}

impl OpenSslApi {
    /// Resolve every mandatory entry point, aborting if any is missing.
    ///
    /// The `_ex` handshake variants funnel through these entry points inside
    /// libssl and need no hooks of their own.
    pub fn resolve(source: &impl SymbolSource) -> Self {
        unsafe {
            Self {
                ssl_new: mem::transmute::<*mut c_void, SslNewFn>(
                    source.resolve_mandatory(c"SSL_new").as_ptr(),
                ),
                connect: mem::transmute::<*mut c_void, SslHandshakeFn>(
                    source.resolve_mandatory(c"SSL_connect").as_ptr(),
                ),
                do_handshake: mem::transmute::<*mut c_void, SslHandshakeFn>(
                    source.resolve_mandatory(c"SSL_do_handshake").as_ptr(),
                ),
                accept: mem::transmute::<*mut c_void, SslHandshakeFn>(
                    source.resolve_mandatory(c"SSL_accept").as_ptr(),
                ),
                get_client_random: mem::transmute::<*mut c_void, SslGetClientRandomFn>(
                    source.resolve_mandatory(c"SSL_get_client_random").as_ptr(),
                ),
                session_get_master_key: mem::transmute::<*mut c_void, SslSessionGetMasterKeyFn>(
                    source
                        .resolve_mandatory(c"SSL_SESSION_get_master_key")
                        .as_ptr(),
                ),
                get_session: mem::transmute::<*mut c_void, SslGetSessionFn>(
                    source.resolve_mandatory(c"SSL_get_session").as_ptr(),
                ),
            }
        }
    }
}

/// How secrets are captured from the loaded libssl.
///
/// Decided once at initialization and carried as data; call sites branch on
/// the variant, never re-probe the library.
#[derive(Debug, Clone, Copy)]
pub enum CaptureMode {
    /// `SSL_CTX_set_keylog_callback` is available (OpenSSL 1.1.1+): libssl
    /// itself reports every secret it derives, across the full protocol
    /// range it negotiates, TLS 1.3 included. The registration entry point
    /// is carried in the variant.
    Callback(SslCtxSetKeylogCallbackFn),

    /// Older libssl (1.1.0): secrets are diffed around each handshake call.
    /// Such versions speak TLS 1.2 at most, which the diff covers.
    Hook,
}

impl CaptureMode {
    /// Probe the loaded libssl for the key-log callback entry point.
    pub fn detect(source: &impl SymbolSource) -> Self {
        match source.resolve(c"SSL_CTX_set_keylog_callback") {
            Some(symbol) => {
                info!("libssl exposes the key-log callback, using callback capture");
                let register = unsafe {
                    mem::transmute::<*mut c_void, SslCtxSetKeylogCallbackFn>(symbol.as_ptr())
                };
                CaptureMode::Callback(register)
            }
            None => {
                info!("No key-log callback in libssl, using handshake hook capture");
                CaptureMode::Hook
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::ptr::NonNull;

    /// Symbol source standing in for a loaded libssl. Returns dangling,
    /// never-called pointers for every known symbol.
    struct FakeLibssl {
        with_keylog_callback: bool,
    }

    impl SymbolSource for FakeLibssl {
        fn resolve(&self, name: &CStr) -> Option<NonNull<c_void>> {
            if name == c"SSL_CTX_set_keylog_callback" && !self.with_keylog_callback {
                return None;
            }
            NonNull::new(8usize as *mut c_void)
        }
    }

    #[test]
    fn test_modern_libssl_selects_callback_mode() {
        let source = FakeLibssl {
            with_keylog_callback: true,
        };
        assert!(matches!(
            CaptureMode::detect(&source),
            CaptureMode::Callback(_)
        ));
    }

    #[test]
    fn test_legacy_libssl_selects_hook_mode() {
        let source = FakeLibssl {
            with_keylog_callback: false,
        };
        assert!(matches!(CaptureMode::detect(&source), CaptureMode::Hook));
    }

    #[test]
    fn test_mandatory_table_resolves_from_fake() {
        let source = FakeLibssl {
            with_keylog_callback: false,
        };
        // Builds without aborting when every mandatory symbol is present.
        let _ = OpenSslApi::resolve(&source);
    }
}

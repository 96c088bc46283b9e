// src/interception/hooks.rs
//! Interposed libssl entry points
//!
//! These `#[no_mangle]` definitions shadow libssl's exports when the shim is
//! loaded ahead of it. Each mirrors the real signature and return semantics
//! exactly and forwards arguments untouched: capture is a side effect that
//! never changes what the application observes, only reads state the real
//! call already produced.
//!
//! In callback mode the handshake entry points are pure pass-throughs —
//! libssl reports every secret through the registered callback. In hook
//! mode the master key is snapshotted before and after the real call and a
//! record is written only when a successful call changed it.

use crate::interception::context::ShimContext;
use crate::interception::openssl::{CaptureMode, SslHandshakeFn, SSL, SSL_CTX};
use crate::recording::extractor::{ClientRandomSnapshot, MasterKeySnapshot};
use libc::{c_char, c_int};
use std::ffi::CStr;
use tracing::trace;

/// Callback registered on every context in callback mode; libssl hands over
/// one NSS-format line per derived secret.
unsafe extern "C" fn keylog_line_cb(_ssl: *const SSL, line: *const c_char) {
    if line.is_null() {
        return;
    }
    if let Some(shim) = ShimContext::current() {
        shim.writer.append_line(CStr::from_ptr(line));
    }
}

/// Wrap a real handshake call with before/after master-key snapshots,
/// emitting one record when the call succeeded and the key changed.
///
/// An unchanged key means the session resumed with its previous secret;
/// downstream decryptors tolerate duplicate lines, but re-logging only
/// grows the file, so resumption writes nothing.
unsafe fn observed_handshake(shim: &ShimContext, ssl: *mut SSL, real: SslHandshakeFn) -> c_int {
    let before = MasterKeySnapshot::capture(&shim.api, ssl);

    let ret = real(ssl);

    if ret == 1 {
        let after = MasterKeySnapshot::capture(&shim.api, ssl);
        if after.differs_from(&before) {
            let client_random = ClientRandomSnapshot::capture(&shim.api, ssl);
            trace!("Handshake derived a new master key ({} bytes)", after.len());
            shim.writer.append_secret(&client_random, &after);
        }
    }
    ret
}

/// `SSL_new` — create a connection object from `ctx`.
///
/// Triggers one-time initialization, then, in callback mode, registers the
/// key-log callback on `ctx` before delegating so every secret the new
/// connection derives is reported by libssl itself.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn SSL_new(ctx: *mut SSL_CTX) -> *mut SSL {
    let shim = ShimContext::shared();

    if let CaptureMode::Callback(register_keylog) = shim.mode {
        register_keylog(ctx, keylog_line_cb);
    }

    (shim.api.ssl_new)(ctx)
}

/// `SSL_connect` — run the handshake as the initiating side.
///
/// Returns the real call's result unmodified: 1 on success, 0 on a
/// controlled shutdown, negative on a fatal error.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn SSL_connect(ssl: *mut SSL) -> c_int {
    let shim = ShimContext::shared();
    match shim.mode {
        CaptureMode::Callback(_) => (shim.api.connect)(ssl),
        CaptureMode::Hook => observed_handshake(shim, ssl, shim.api.connect),
    }
}

/// `SSL_do_handshake` — run a handshake step for either side.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn SSL_do_handshake(ssl: *mut SSL) -> c_int {
    let shim = ShimContext::shared();
    match shim.mode {
        CaptureMode::Callback(_) => (shim.api.do_handshake)(ssl),
        CaptureMode::Hook => observed_handshake(shim, ssl, shim.api.do_handshake),
    }
}

/// `SSL_accept` — run the handshake as the accepting side.
///
/// Always takes the snapshot path, independent of capture mode: the
/// per-context callback registration in [`SSL_new`] does not reach the
/// accepting side in every supported configuration (e.g. a context created
/// before this object was loaded), so the diff-based capture stays on here.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn SSL_accept(ssl: *mut SSL) -> c_int {
    let shim = ShimContext::shared();
    observed_handshake(shim, ssl, shim.api.accept)
}

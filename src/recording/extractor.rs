// src/recording/extractor.rs
//! Session secret snapshots
//!
//! Fixed-capacity copies of the secrets a handshake session holds: the
//! 32-byte client random and the negotiated master key (up to 48 bytes,
//! shorter for some cipher suites). A length of 0 means the value was not
//! available at capture time. Snapshots are immutable once captured and
//! compared by byte content.

use crate::interception::openssl::{OpenSslApi, SSL};

/// Size of the client random in bytes (SSL3_RANDOM_SIZE).
pub const CLIENT_RANDOM_SIZE: usize = 32;

/// Largest master key any cipher suite negotiates
/// (SSL_MAX_MASTER_KEY_LENGTH).
pub const MAX_MASTER_KEY_SIZE: usize = 48;

/// Snapshot of a session's client random.
#[derive(Debug, Clone, Copy)]
pub struct ClientRandomSnapshot {
    value: [u8; CLIENT_RANDOM_SIZE],
    length: usize,
}

impl ClientRandomSnapshot {
    /// An empty (unavailable) snapshot.
    pub const fn empty() -> Self {
        Self {
            value: [0; CLIENT_RANDOM_SIZE],
            length: 0,
        }
    }

    /// Build a snapshot from raw bytes. Panics if `bytes` exceeds the
    /// declared capacity.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(
            bytes.len() <= CLIENT_RANDOM_SIZE,
            "client random exceeds {} bytes",
            CLIENT_RANDOM_SIZE
        );
        let mut snapshot = Self::empty();
        snapshot.value[..bytes.len()].copy_from_slice(bytes);
        snapshot.length = bytes.len();
        snapshot
    }

    /// Read the client random of `ssl`.
    ///
    /// # Safety
    ///
    /// `ssl` must be a live connection object belonging to the library the
    /// entry points in `api` were resolved from.
    pub unsafe fn capture(api: &OpenSslApi, ssl: *const SSL) -> Self {
        let mut snapshot = Self::empty();
        snapshot.length =
            (api.get_client_random)(ssl, snapshot.value.as_mut_ptr(), CLIENT_RANDOM_SIZE);
        snapshot
    }

    /// The captured bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.value[..self.length]
    }

    /// True when nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of captured bytes.
    pub fn len(&self) -> usize {
        self.length
    }
}

/// Snapshot of a session's master key.
#[derive(Debug, Clone, Copy)]
pub struct MasterKeySnapshot {
    value: [u8; MAX_MASTER_KEY_SIZE],
    length: usize,
}

impl MasterKeySnapshot {
    /// An empty (unavailable) snapshot.
    pub const fn empty() -> Self {
        Self {
            value: [0; MAX_MASTER_KEY_SIZE],
            length: 0,
        }
    }

    /// Build a snapshot from raw bytes. Panics if `bytes` exceeds the
    /// declared capacity.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(
            bytes.len() <= MAX_MASTER_KEY_SIZE,
            "master key exceeds {} bytes",
            MAX_MASTER_KEY_SIZE
        );
        let mut snapshot = Self::empty();
        snapshot.value[..bytes.len()].copy_from_slice(bytes);
        snapshot.length = bytes.len();
        snapshot
    }

    /// Read the master key of `ssl`'s current session.
    ///
    /// A connection with no session attached yet yields an empty snapshot.
    ///
    /// # Safety
    ///
    /// `ssl` must be a live connection object belonging to the library the
    /// entry points in `api` were resolved from.
    pub unsafe fn capture(api: &OpenSslApi, ssl: *const SSL) -> Self {
        let mut snapshot = Self::empty();
        let session = (api.get_session)(ssl);
        if !session.is_null() {
            snapshot.length = (api.session_get_master_key)(
                session,
                snapshot.value.as_mut_ptr(),
                MAX_MASTER_KEY_SIZE,
            );
        }
        snapshot
    }

    /// True when this snapshot holds a key that differs from `before`.
    ///
    /// The comparison window is this snapshot's length; an empty snapshot
    /// never differs. A session that resumed with its previous key compares
    /// equal here, which is what suppresses redundant log lines.
    pub fn differs_from(&self, before: &Self) -> bool {
        self.length > 0 && self.value[..self.length] != before.value[..self.length]
    }

    /// The captured bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.value[..self.length]
    }

    /// True when nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of captured bytes.
    pub fn len(&self) -> usize {
        self.length
    }
}

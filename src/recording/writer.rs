// src/recording/writer.rs
//! NSS key-log file writer
//!
//! Owns the process-wide output file descriptor, lazily opened from the
//! configured path. The file is opened with `O_APPEND` and every record is
//! staged in a fixed stack buffer and issued as a single `write(2)`, so the
//! kernel appends each line atomically even when several instrumented
//! processes share one key-log file. No userspace lock is taken on the
//! handshake path.

use crate::recording::extractor::{
    ClientRandomSnapshot, MasterKeySnapshot, CLIENT_RANDOM_SIZE, MAX_MASTER_KEY_SIZE,
};
use crate::utils::errors::{Result, ShimError};
use libc::c_void;
use std::ffi::{CStr, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};
use tracing::{debug, warn};

/// Literal keyword prefix of every hook-path record.
const CLIENT_RANDOM_PREFIX: &[u8] = b"CLIENT_RANDOM ";

/// Exact capacity of one hook-path record: keyword, 64 hex chars of client
/// random, separator, up to 96 hex chars of master key, newline.
const RECORD_CAPACITY: usize =
    CLIENT_RANDOM_PREFIX.len() + CLIENT_RANDOM_SIZE * 2 + 1 + MAX_MASTER_KEY_SIZE * 2 + 1;

/// Upper bound for a callback-delivered line. The longest NSS label lines
/// stay well under this.
const CALLBACK_LINE_CAPACITY: usize = 512;

/// Sentinel fd meaning "logging disabled".
const DISABLED: i32 = -1;

/// Append-only writer for the key-log file.
///
/// The fd is shared process-wide and immutable after `open` except for the
/// single transition to the disabled sentinel in [`KeyLogWriter::finalize`].
pub struct KeyLogWriter {
    fd: AtomicI32,
}

impl KeyLogWriter {
    /// A writer with logging permanently disabled.
    pub const fn disabled() -> Self {
        Self {
            fd: AtomicI32::new(DISABLED),
        }
    }

    /// Open the key-log file for append-only, create-if-missing access.
    ///
    /// `None`, or a path that cannot be opened, yields a disabled writer:
    /// capture is off, the wrapped library is unaffected. Neither case is an
    /// error to the caller.
    pub fn open(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            debug!("No key-log path configured, capture disabled");
            return Self::disabled();
        };

        match Self::open_append(path) {
            Ok(fd) => {
                debug!("Key-log file {:?} opened (fd {})", path, fd);
                Self {
                    fd: AtomicI32::new(fd),
                }
            }
            Err(e) => {
                warn!("{}, capture disabled", e);
                Self::disabled()
            }
        }
    }

    fn open_append(path: &Path) -> Result<i32> {
        let raw_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
            ShimError::ConfigError(format!("Key-log path contains a NUL byte: {:?}", path))
        })?;

        // O_APPEND at the open(2) level rather than buffered stdio append:
        // the kernel then treats each write as one indivisible append, which
        // is what keeps concurrent writers of a shared path from
        // interleaving inside a line.
        let fd = unsafe {
            libc::open(
                raw_path.as_ptr(),
                libc::O_WRONLY | libc::O_APPEND | libc::O_CREAT,
                0o644,
            )
        };
        if fd < 0 {
            return Err(ShimError::WriterFailed(format!(
                "Failed to open {:?}: {}",
                path,
                std::io::Error::last_os_error()
            )));
        }
        Ok(fd)
    }

    /// Whether a file is open.
    pub fn is_enabled(&self) -> bool {
        self.fd.load(Ordering::Acquire) != DISABLED
    }

    /// Append one `CLIENT_RANDOM` record for the given secrets.
    ///
    /// A snapshot with a missing field is skipped entirely; a write failure
    /// is ignored (best-effort I/O, never surfaced to the handshake).
    pub fn append_secret(
        &self,
        client_random: &ClientRandomSnapshot,
        master_key: &MasterKeySnapshot,
    ) {
        let fd = self.fd.load(Ordering::Acquire);
        if fd == DISABLED || client_random.is_empty() || master_key.is_empty() {
            return;
        }

        let mut line = [0u8; RECORD_CAPACITY];
        let length = format_record(&mut line, client_random.as_bytes(), master_key.as_bytes());
        best_effort_write(fd, &line[..length]);
    }

    /// Append a callback-delivered key-log line (NUL-terminated, no trailing
    /// newline; one is added here).
    pub fn append_line(&self, line: &CStr) {
        let fd = self.fd.load(Ordering::Acquire);
        if fd == DISABLED {
            return;
        }

        let bytes = line.to_bytes();
        if bytes.len() < CALLBACK_LINE_CAPACITY {
            let mut staged = [0u8; CALLBACK_LINE_CAPACITY];
            staged[..bytes.len()].copy_from_slice(bytes);
            staged[bytes.len()] = b'\n';
            best_effort_write(fd, &staged[..bytes.len() + 1]);
        } else {
            // No current TLS label produces a line this long; keep the
            // material rather than drop it, at the cost of losing
            // single-write atomicity for this line.
            best_effort_write(fd, bytes);
            best_effort_write(fd, b"\n");
        }
    }

    /// Close the file exactly once. Later appends become no-ops; calling
    /// this again is a no-op too.
    pub fn finalize(&self) {
        let fd = self.fd.swap(DISABLED, Ordering::AcqRel);
        if fd != DISABLED {
            unsafe {
                libc::close(fd);
            }
        }
    }
}

impl Drop for KeyLogWriter {
    fn drop(&mut self) {
        self.finalize();
    }
}

/// Format `CLIENT_RANDOM <hex> <hex>\n` into `buf`, returning the line
/// length. Hex is lowercase, two characters per byte, no separators.
///
/// Field maxima are a hard contract: an oversized input is a caller bug and
/// asserts rather than truncating.
fn format_record(buf: &mut [u8; RECORD_CAPACITY], client_random: &[u8], master_key: &[u8]) -> usize {
    assert!(
        client_random.len() <= CLIENT_RANDOM_SIZE && master_key.len() <= MAX_MASTER_KEY_SIZE,
        "record fields exceed their declared maxima"
    );

    let mut at = CLIENT_RANDOM_PREFIX.len();
    buf[..at].copy_from_slice(CLIENT_RANDOM_PREFIX);
    at += hex_encode(&mut buf[at..], client_random);
    buf[at] = b' ';
    at += 1;
    at += hex_encode(&mut buf[at..], master_key);
    buf[at] = b'\n';
    at + 1
}

/// Lowercase hex encoding; returns the number of bytes written.
fn hex_encode(out: &mut [u8], input: &[u8]) -> usize {
    const TABLE: &[u8; 16] = b"0123456789abcdef";
    for (i, byte) in input.iter().enumerate() {
        out[i * 2] = TABLE[(byte >> 4) as usize];
        out[i * 2 + 1] = TABLE[(byte & 0x0f) as usize];
    }
    input.len() * 2
}

fn best_effort_write(fd: i32, buf: &[u8]) {
    let _ = unsafe { libc::write(fd, buf.as_ptr() as *const c_void, buf.len()) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_golden_record_format() {
        let client_random: Vec<u8> = (0x00..=0x1f).collect();
        let master_key: Vec<u8> = (0xa0..=0xcf).collect();

        let mut buf = [0u8; RECORD_CAPACITY];
        let length = format_record(&mut buf, &client_random, &master_key);

        let expected = "CLIENT_RANDOM \
             000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f \
             a0a1a2a3a4a5a6a7a8a9aaabacadaeafb0b1b2b3b4b5b6b7b8b9babbbcbdbebf\
             c0c1c2c3c4c5c6c7c8c9cacbcccdcecf\n";
        assert_eq!(&buf[..length], expected.as_bytes());
    }

    #[test]
    fn test_short_master_key_shortens_field() {
        let mut buf = [0u8; RECORD_CAPACITY];
        let length = format_record(&mut buf, &[0u8; 32], &[0xffu8; 32]);

        let line = std::str::from_utf8(&buf[..length]).unwrap();
        let key_field = line.trim_end().rsplit(' ').next().unwrap();
        assert_eq!(key_field.len(), 64);
        assert!(key_field.bytes().all(|b| b == b'f'));
    }

    #[test]
    fn test_append_secret_writes_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.log");

        let writer = KeyLogWriter::open(Some(&path));
        assert!(writer.is_enabled());

        let client_random = ClientRandomSnapshot::from_bytes(&[0x11; 32]);
        let master_key = MasterKeySnapshot::from_bytes(&[0x22; 48]);
        writer.append_secret(&client_random, &master_key);
        writer.finalize();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.starts_with("CLIENT_RANDOM 1111"));
        assert!(contents.ends_with("\n"));
    }

    #[test]
    fn test_empty_snapshots_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.log");

        let writer = KeyLogWriter::open(Some(&path));
        writer.append_secret(
            &ClientRandomSnapshot::empty(),
            &MasterKeySnapshot::from_bytes(&[0x22; 48]),
        );
        writer.append_secret(
            &ClientRandomSnapshot::from_bytes(&[0x11; 32]),
            &MasterKeySnapshot::empty(),
        );
        writer.finalize();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_append_line_adds_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.log");

        let writer = KeyLogWriter::open(Some(&path));
        writer.append_line(c"CLIENT_HANDSHAKE_TRAFFIC_SECRET 00 11");
        writer.finalize();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "CLIENT_HANDSHAKE_TRAFFIC_SECRET 00 11\n");
    }

    #[test]
    fn test_no_path_disables_writer() {
        let writer = KeyLogWriter::open(None);
        assert!(!writer.is_enabled());

        // Appends on a disabled writer are silent no-ops.
        writer.append_secret(
            &ClientRandomSnapshot::from_bytes(&[0x11; 32]),
            &MasterKeySnapshot::from_bytes(&[0x22; 48]),
        );
    }

    #[test]
    fn test_unopenable_path_degrades_silently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("keys.log");

        let writer = KeyLogWriter::open(Some(&path));
        assert!(!writer.is_enabled());

        writer.append_secret(
            &ClientRandomSnapshot::from_bytes(&[0x11; 32]),
            &MasterKeySnapshot::from_bytes(&[0x22; 48]),
        );
        assert!(!path.exists());
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.log");

        let writer = KeyLogWriter::open(Some(&path));
        let client_random = ClientRandomSnapshot::from_bytes(&[0x11; 32]);
        let master_key = MasterKeySnapshot::from_bytes(&[0x22; 48]);
        writer.append_secret(&client_random, &master_key);

        writer.finalize();
        writer.finalize();
        assert!(!writer.is_enabled());

        // Writes after finalize go nowhere.
        writer.append_secret(&client_random, &master_key);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn test_concurrent_appends_keep_lines_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.log");

        let writer = Arc::new(KeyLogWriter::open(Some(&path)));
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let writer = Arc::clone(&writer);
                std::thread::spawn(move || {
                    let client_random = ClientRandomSnapshot::from_bytes(&[i; 32]);
                    let master_key = MasterKeySnapshot::from_bytes(&[0x80 | i; 48]);
                    for _ in 0..16 {
                        writer.append_secret(&client_random, &master_key);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        writer.finalize();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 128);
        for line in contents.lines() {
            assert_eq!(line.len(), RECORD_CAPACITY - 1);
            assert!(line.starts_with("CLIENT_RANDOM "));
        }

        // Every thread's line survived unmangled.
        let distinct: std::collections::HashSet<&str> = contents.lines().collect();
        assert_eq!(distinct.len(), 8);
    }

    proptest! {
        #[test]
        fn format_record_emits_lowercase_fixed_width_hex(
            client_random in prop::array::uniform32(any::<u8>()),
            master_key in prop::collection::vec(any::<u8>(), 1..=MAX_MASTER_KEY_SIZE),
        ) {
            let mut buf = [0u8; RECORD_CAPACITY];
            let length = format_record(&mut buf, &client_random, &master_key);

            let line = std::str::from_utf8(&buf[..length]).unwrap();
            prop_assert!(line.starts_with("CLIENT_RANDOM "));
            prop_assert!(line.ends_with('\n'));

            let mut fields = line.trim_end().split(' ');
            fields.next();
            let random_hex = fields.next().unwrap();
            let key_hex = fields.next().unwrap();
            prop_assert!(fields.next().is_none());

            prop_assert_eq!(random_hex.len(), CLIENT_RANDOM_SIZE * 2);
            prop_assert_eq!(key_hex.len(), master_key.len() * 2);
            prop_assert!(random_hex
                .bytes()
                .chain(key_hex.bytes())
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
        }
    }
}

//! Integrity hashing for intact.
//!
//! Both ends of a transfer hash the *uncompressed* file bytes with SHA-256
//! and exchange the digest as 64 lowercase hex characters. The two strings
//! are compared byte-for-byte, so the encoding here is part of the wire
//! contract.

use std::io::Read;

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest.
pub const CHECKSUM_HEX_LEN: usize = 64;

// ── One-shot ──────────────────────────────────────────────────────────────────

/// Hash a byte slice, returning the lowercase hex SHA-256 digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut h = IntegrityHasher::new();
    h.update(data);
    h.finalize()
}

/// Hash everything `reader` yields, reading `chunk_size` bytes at a time.
///
/// Memory use is one chunk buffer regardless of input length.
pub fn checksum_reader<R: Read>(mut reader: R, chunk_size: usize) -> std::io::Result<String> {
    let mut h = IntegrityHasher::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        h.update(&buf[..n]);
    }
    Ok(h.finalize())
}

// ── Incremental ───────────────────────────────────────────────────────────────

/// Incremental SHA-256 hasher for payloads that arrive in pieces.
///
/// `finalize` takes `self`, so a hasher cannot be finalized twice or
/// updated after finalization.
///
/// # Example
/// ```
/// use intact_core::digest::{checksum_bytes, IntegrityHasher};
/// let mut h = IntegrityHasher::new();
/// h.update(b"hello ");
/// h.update(b"world");
/// assert_eq!(h.finalize(), checksum_bytes(b"hello world"));
/// ```
#[derive(Clone)]
pub struct IntegrityHasher {
    inner: Sha256,
    bytes: u64,
}

impl IntegrityHasher {
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
            bytes: 0,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.bytes += data.len() as u64;
    }

    /// Number of bytes fed so far.
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes
    }

    pub fn finalize(self) -> String {
        hex::encode(self.inner.finalize())
    }
}

impl Default for IntegrityHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// True if `s` has the shape of a digest produced by this module.
pub fn is_well_formed(s: &str) -> bool {
    s.len() == CHECKSUM_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

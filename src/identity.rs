//! Content identity.
//!
//! A file's identity is the SHA-256 digest of its full byte content — not
//! its path. Identical bytes always produce the same digest; a single-byte
//! change produces a different one. The digest tags every document and
//! chunk a file produces (`source_id`) and drives change detection.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of a byte slice.
pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

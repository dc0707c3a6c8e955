//! Storage digest for cache keys.

use sha2::{Digest, Sha256};

/// Compute the storage digest of a request key.
pub fn key_digest(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

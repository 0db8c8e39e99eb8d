//! Content-address generation for cached documents.

use sha2::{Digest, Sha256};

/// Compute the content address for a URL.
///
/// The address is the SHA-256 digest of the URL string, hex-encoded.
/// It is the sole primary key under which the document store keeps the
/// cached copy of that URL.
pub fn content_address(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

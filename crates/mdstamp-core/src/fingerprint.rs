//! Content fingerprints.
//!
//! A fingerprint is the lowercase hex SHA-256 digest of the UTF-8 bytes of a
//! document body. It is stored in the `hash` header field of the same
//! document and nowhere else.
//!
//! Hashes written by tools that use SHA-1 never match, so a document stamped
//! by such a tool is rewritten once, the first time mdstamp sees it.

use sha2::{Digest, Sha256};

/// Compute the fingerprint of `body`.
///
/// Callers are expected to pass the already-trimmed body.
#[must_use]
pub fn fingerprint(body: &str) -> String {
    format!("{:x}", Sha256::digest(body.as_bytes()))
}

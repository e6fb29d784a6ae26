//! Content hashing for generated-artifact provenance.
//!
//! Every rendered header embeds the SHA-256 of the exact definition file it
//! was compiled from, so stale generated output can be detected.

use sha2::{Digest, Sha256};

/// SHA-256 of `bytes` as a lowercase hex string.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

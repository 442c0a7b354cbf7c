//! Content fingerprinting.

use sha2::{Digest, Sha256};

/// SHA-256 of `content` as lowercase hex.
pub fn fingerprint(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

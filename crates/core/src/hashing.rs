//! SHA-256 helpers: stored access-code digests and session key derivation.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256, the form access-code hashes are stored in.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// A 256-bit key from `SHA-256(context ‖ secret)`.
///
/// The context string keeps keys derived from one secret for different
/// purposes apart.
pub fn derive_key(context: &[u8], secret: &[u8]) -> [u8; 32] {
    Sha256::new()
        .chain_update(context)
        .chain_update(secret)
        .finalize()
        .into()
}

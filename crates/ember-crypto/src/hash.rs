//! SHA-256 hashing

use ember_primitives::H256;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input
pub fn sha256(data: &[u8]) -> H256 {
    let digest = Sha256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    H256::from_bytes(bytes)
}

/// Compute the double SHA-256 hash of the input.
///
/// This is the identity hash for blocks and transactions.
pub fn sha256d(data: &[u8]) -> H256 {
    let first = Sha256::digest(data);
    let digest = Sha256::digest(first);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    H256::from_bytes(bytes)
}

//! Index key encoding

use crate::error::{StorageError, StorageResult};

/// Encode a block height as a height-index key.
///
/// Keys are 4-byte big-endian so byte-wise key order matches numeric height
/// order and the height index can be traversed in ascending block order.
/// Heights beyond `u32::MAX` do not fit the key space and are rejected
/// rather than wrapped. Every call returns a freshly owned key.
pub fn height_key(height: u64) -> StorageResult<[u8; 4]> {
    let narrowed =
        u32::try_from(height).map_err(|_| StorageError::HeightOutOfRange { height })?;
    Ok(narrowed.to_be_bytes())
}

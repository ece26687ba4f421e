//! Cumulative chain work

use std::cmp::Ordering;
use std::fmt;

/// Cumulative proof-of-work value, an arbitrary-precision unsigned integer
/// held as big-endian bytes.
///
/// The value is normalized on construction (leading zero bytes stripped), so
/// equality and ordering behave like big-integer comparison regardless of how
/// the input was padded.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ChainWork(Vec<u8>);

impl ChainWork {
    /// Zero work
    pub fn zero() -> Self {
        ChainWork(Vec::new())
    }

    /// Create from big-endian bytes
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        ChainWork(bytes[start..].to_vec())
    }

    /// Get as normalized big-endian bytes (no leading zeros)
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<u64> for ChainWork {
    fn from(value: u64) -> Self {
        ChainWork::from_be_bytes(&value.to_be_bytes())
    }
}

impl Ord for ChainWork {
    fn cmp(&self, other: &Self) -> Ordering {
        // Normalized representation: a longer byte string is a larger integer.
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for ChainWork {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for ChainWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainWork(0x{})", hex::encode(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert!(ChainWork::zero().is_zero());
        assert_eq!(ChainWork::zero(), ChainWork::from_be_bytes(&[]));
        assert_eq!(ChainWork::default(), ChainWork::zero());
    }

    #[test]
    fn test_leading_zeros_stripped() {
        let padded = ChainWork::from_be_bytes(&[0, 0, 0, 1, 2]);
        let tight = ChainWork::from_be_bytes(&[1, 2]);
        assert_eq!(padded, tight);
        assert_eq!(padded.as_bytes(), &[1, 2]);
    }

    #[test]
    fn test_all_zero_bytes() {
        let work = ChainWork::from_be_bytes(&[0, 0, 0, 0]);
        assert!(work.is_zero());
    }

    #[test]
    fn test_from_u64() {
        let work = ChainWork::from(0x0102u64);
        assert_eq!(work.as_bytes(), &[1, 2]);
        assert!(ChainWork::from(0u64).is_zero());
    }

    #[test]
    fn test_big_integer_ordering() {
        let small = ChainWork::from(0xffu64);
        let medium = ChainWork::from(0x0100u64);
        let large = ChainWork::from_be_bytes(&[1; 33]);

        assert!(small < medium);
        assert!(medium < large);
        assert!(ChainWork::zero() < small);
    }

    #[test]
    fn test_same_length_ordering() {
        let a = ChainWork::from_be_bytes(&[1, 0]);
        let b = ChainWork::from_be_bytes(&[2, 0]);
        assert!(a < b);
    }

    #[test]
    fn test_large_value_roundtrip() {
        let bytes = vec![0xab; 300];
        let work = ChainWork::from_be_bytes(&bytes);
        assert_eq!(work.as_bytes(), &bytes[..]);
        assert_eq!(ChainWork::from_be_bytes(work.as_bytes()), work);
    }
}

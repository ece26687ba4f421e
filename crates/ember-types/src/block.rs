//! Block types for Emberchain

use ember_primitives::{BlockHash, ChainWork, TxHash, H256};

/// A stored block: header fields, chain position metadata, and the ordered
/// hashes of the transactions it contains.
///
/// Blocks are immutable once persisted, with one exception: `active` flips
/// when a reorganization moves the block on or off the best chain, in which
/// case the block is saved again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Hash of the predecessor block
    pub prev_hash: BlockHash,
    /// Merkle root over the contained transactions
    pub merkle_root: H256,
    /// Block timestamp (Unix seconds)
    pub timestamp: u64,
    /// Difficulty target in compact form
    pub bits: u32,
    /// Proof-of-work nonce
    pub nonce: u32,
    /// Protocol version
    pub version: u32,
    /// Chain height; unique among active blocks, not across forks
    pub height: u64,
    /// Serialized size of the full block in bytes
    pub size: u32,
    /// Whether the block is on the currently selected best chain
    pub active: bool,
    /// Cumulative proof-of-work up to and including this block
    pub chain_work: ChainWork,
    /// Ordered hashes of the contained transactions
    pub txs: Vec<TxHash>,
}

impl Block {
    /// Number of bytes in the canonical header serialization
    pub const HEADER_LEN: usize = 4 + 32 + 32 + 8 + 4 + 4;

    /// Canonical header serialization, the preimage of the block hash.
    pub fn header_bytes(&self) -> [u8; Self::HEADER_LEN] {
        let mut buf = [0u8; Self::HEADER_LEN];
        let mut pos = 0;
        buf[pos..pos + 4].copy_from_slice(&self.version.to_le_bytes());
        pos += 4;
        buf[pos..pos + 32].copy_from_slice(self.prev_hash.as_bytes());
        pos += 32;
        buf[pos..pos + 32].copy_from_slice(self.merkle_root.as_bytes());
        pos += 32;
        buf[pos..pos + 8].copy_from_slice(&self.timestamp.to_le_bytes());
        pos += 8;
        buf[pos..pos + 4].copy_from_slice(&self.bits.to_le_bytes());
        pos += 4;
        buf[pos..pos + 4].copy_from_slice(&self.nonce.to_le_bytes());
        buf
    }

    /// Identity hash of the block (double SHA-256 of the header).
    ///
    /// Only header fields contribute; chain position metadata (`height`,
    /// `active`, `chain_work`) does not, so flipping `active` during a
    /// reorganization keeps the hash stable.
    pub fn hash(&self) -> BlockHash {
        ember_crypto::sha256d(&self.header_bytes())
    }

    /// Check if this is the genesis block
    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.prev_hash.is_zero()
    }

    /// Number of transactions in the block
    pub fn tx_count(&self) -> usize {
        self.txs.len()
    }
}

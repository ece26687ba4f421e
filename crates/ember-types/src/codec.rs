//! Binary encoding/decoding for stored records.
//!
//! Provides the deterministic serialization the storage layer persists for
//! blocks and transactions. Decoding is the exact inverse of encoding and is
//! binary-safe for every field, including hashes containing arbitrary bytes
//! and chain-work values of any magnitude.

use crate::block::Block;
use crate::transaction::Transaction;
use ember_primitives::{ChainWork, H256};

// ============================================================================
// Block Record Encoding
// ============================================================================

/// Encode a block record to bytes.
///
/// Field order is the stable wire order: prev_hash, merkle_root, timestamp,
/// bits, nonce, version, height, size, active, chain_work, txs.
pub fn encode_block(block: &Block) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(block.prev_hash.as_bytes()); // 32
    buf.extend_from_slice(block.merkle_root.as_bytes()); // 32
    buf.extend_from_slice(&block.timestamp.to_le_bytes()); // 8
    buf.extend_from_slice(&block.bits.to_le_bytes()); // 4
    buf.extend_from_slice(&block.nonce.to_le_bytes()); // 4
    buf.extend_from_slice(&block.version.to_le_bytes()); // 4
    buf.extend_from_slice(&block.height.to_le_bytes()); // 8
    buf.extend_from_slice(&block.size.to_le_bytes()); // 4
    buf.push(block.active as u8); // 1
    buf.extend_from_slice(&(block.chain_work.as_bytes().len() as u32).to_le_bytes()); // 4
    buf.extend_from_slice(block.chain_work.as_bytes()); // variable
    buf.extend_from_slice(&(block.txs.len() as u32).to_le_bytes()); // 4
    for tx in &block.txs {
        buf.extend_from_slice(tx.as_bytes()); // 32 each
    }
    buf
}

/// Decode a block record from bytes.
///
/// Returns `None` on truncated input, trailing bytes, or any field that
/// could not have been produced by [`encode_block`].
pub fn decode_block(bytes: &[u8]) -> Option<Block> {
    let mut pos = 0;

    let prev_hash = read_hash(bytes, &mut pos)?;
    let merkle_root = read_hash(bytes, &mut pos)?;
    let timestamp = read_u64(bytes, &mut pos)?;
    let bits = read_u32(bytes, &mut pos)?;
    let nonce = read_u32(bytes, &mut pos)?;
    let version = read_u32(bytes, &mut pos)?;
    let height = read_u64(bytes, &mut pos)?;
    let size = read_u32(bytes, &mut pos)?;

    let active = match read_u8(bytes, &mut pos)? {
        0 => false,
        1 => true,
        _ => return None,
    };

    let work_len = read_u32(bytes, &mut pos)? as usize;
    let work_bytes = bytes.get(pos..pos.checked_add(work_len)?)?;
    pos += work_len;
    let chain_work = ChainWork::from_be_bytes(work_bytes);

    let tx_count = read_u32(bytes, &mut pos)? as usize;
    let mut txs = Vec::new();
    for _ in 0..tx_count {
        txs.push(read_hash(bytes, &mut pos)?);
    }

    if pos != bytes.len() {
        return None;
    }

    Some(Block {
        prev_hash,
        merkle_root,
        timestamp,
        bits,
        nonce,
        version,
        height,
        size,
        active,
        chain_work,
        txs,
    })
}

// ============================================================================
// Transaction Record Encoding
// ============================================================================

/// Encode a transaction record (its canonical serialization).
pub fn encode_transaction(tx: &Transaction) -> Vec<u8> {
    tx.serialize()
}

/// Decode a transaction record. `None` if the bytes do not parse as a valid
/// transaction.
pub fn decode_transaction(bytes: &[u8]) -> Option<Transaction> {
    Transaction::parse(bytes)
}

fn read_u8(bytes: &[u8], pos: &mut usize) -> Option<u8> {
    let byte = *bytes.get(*pos)?;
    *pos += 1;
    Some(byte)
}

fn read_u32(bytes: &[u8], pos: &mut usize) -> Option<u32> {
    let slice = bytes.get(*pos..*pos + 4)?;
    *pos += 4;
    Some(u32::from_le_bytes(slice.try_into().ok()?))
}

fn read_u64(bytes: &[u8], pos: &mut usize) -> Option<u64> {
    let slice = bytes.get(*pos..*pos + 8)?;
    *pos += 8;
    Some(u64::from_le_bytes(slice.try_into().ok()?))
}

fn read_hash(bytes: &[u8], pos: &mut usize) -> Option<H256> {
    let slice = bytes.get(*pos..*pos + 32)?;
    *pos += 32;
    H256::from_slice(slice).ok()
}

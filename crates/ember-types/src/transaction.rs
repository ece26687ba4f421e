//! Transaction types and the canonical payload parser

use bytes::Bytes;
use ember_primitives::TxHash;

/// Reference to a specific output of a previous transaction
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// Hash of the transaction holding the output
    pub txid: TxHash,
    /// Output position within that transaction
    pub index: u32,
}

/// Transaction input
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxIn {
    /// Spent output
    pub prev_out: OutPoint,
    /// Unlocking script
    pub script: Bytes,
    /// Sequence number
    pub sequence: u32,
}

/// Transaction output
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOut {
    /// Amount in base units
    pub value: u64,
    /// Locking script
    pub script: Bytes,
}

/// A parsed transaction.
///
/// The canonical byte form produced by [`serialize`](Transaction::serialize)
/// is what the storage layer persists; [`parse`](Transaction::parse) is its
/// exact inverse and rejects anything it could not have produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Transaction format version
    pub version: u32,
    /// Inputs
    pub inputs: Vec<TxIn>,
    /// Outputs
    pub outputs: Vec<TxOut>,
    /// Earliest time/height the transaction may be mined
    pub lock_time: u32,
}

impl Transaction {
    /// Canonical serialization
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.version.to_le_bytes());
        write_varint(&mut buf, self.inputs.len() as u64);
        for input in &self.inputs {
            buf.extend_from_slice(input.prev_out.txid.as_bytes());
            buf.extend_from_slice(&input.prev_out.index.to_le_bytes());
            write_varint(&mut buf, input.script.len() as u64);
            buf.extend_from_slice(&input.script);
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }
        write_varint(&mut buf, self.outputs.len() as u64);
        for output in &self.outputs {
            buf.extend_from_slice(&output.value.to_le_bytes());
            write_varint(&mut buf, output.script.len() as u64);
            buf.extend_from_slice(&output.script);
        }
        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        buf
    }

    /// Parse a transaction from its canonical byte form.
    ///
    /// Returns `None` on any structural violation: truncation, non-minimal
    /// length prefixes, or trailing bytes.
    pub fn parse(bytes: &[u8]) -> Option<Transaction> {
        let mut pos = 0;

        let version = read_u32(bytes, &mut pos)?;

        let input_count = read_varint(bytes, &mut pos)?;
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            let txid = read_hash(bytes, &mut pos)?;
            let index = read_u32(bytes, &mut pos)?;
            let script = read_var_bytes(bytes, &mut pos)?;
            let sequence = read_u32(bytes, &mut pos)?;
            inputs.push(TxIn {
                prev_out: OutPoint { txid, index },
                script,
                sequence,
            });
        }

        let output_count = read_varint(bytes, &mut pos)?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            let value = read_u64(bytes, &mut pos)?;
            let script = read_var_bytes(bytes, &mut pos)?;
            outputs.push(TxOut { value, script });
        }

        let lock_time = read_u32(bytes, &mut pos)?;

        if pos != bytes.len() {
            return None;
        }

        Some(Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    /// Identity hash (double SHA-256 of the canonical serialization)
    pub fn hash(&self) -> TxHash {
        ember_crypto::sha256d(&self.serialize())
    }
}

fn write_varint(buf: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xfc => buf.push(value as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}

// Non-minimal encodings are rejected so every parsed transaction
// re-serializes to the exact input bytes.
fn read_varint(bytes: &[u8], pos: &mut usize) -> Option<u64> {
    let tag = *bytes.get(*pos)?;
    *pos += 1;
    match tag {
        0xfd => {
            let value = u64::from(read_u16(bytes, pos)?);
            (value > 0xfc).then_some(value)
        }
        0xfe => {
            let value = u64::from(read_u32(bytes, pos)?);
            (value > 0xffff).then_some(value)
        }
        0xff => {
            let value = read_u64(bytes, pos)?;
            (value > 0xffff_ffff).then_some(value)
        }
        _ => Some(u64::from(tag)),
    }
}

fn read_u16(bytes: &[u8], pos: &mut usize) -> Option<u16> {
    let slice = bytes.get(*pos..*pos + 2)?;
    *pos += 2;
    Some(u16::from_le_bytes(slice.try_into().ok()?))
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

fn read_hash(bytes: &[u8], pos: &mut usize) -> Option<TxHash> {
    let slice = bytes.get(*pos..*pos + 32)?;
    *pos += 32;
    TxHash::from_slice(slice).ok()
}

fn read_var_bytes(bytes: &[u8], pos: &mut usize) -> Option<Bytes> {
    let len = usize::try_from(read_varint(bytes, pos)?).ok()?;
    let slice = bytes.get(*pos..pos.checked_add(len)?)?;
    *pos += len;
    Some(Bytes::copy_from_slice(slice))
}

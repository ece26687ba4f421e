//! Chain store: the block and transaction tables plus their secondary
//! indexes.
//!
//! Writers go through [`ChainDb::save_block`] / the transaction save calls;
//! readers resolve point lookups, batched lookups, locator resolution and the
//! chain tip without scanning the primary tables.

use crate::db::{cf, Database};
use crate::error::{StorageError, StorageResult};
use crate::keys;
use ember_primitives::{BlockHash, TxHash};
use ember_types::{codec, Block, OutPoint, Transaction};
use tracing::{debug, info};

/// Reference to a block at the store API boundary.
///
/// Callers variously hold a bare hash or a full block value; normalization to
/// a hash happens once, here, instead of at every internal call site.
#[derive(Clone, Copy)]
pub enum BlockRef<'a> {
    /// Reference by identity hash
    Hash(BlockHash),
    /// Reference by block value
    Block(&'a Block),
}

impl BlockRef<'_> {
    /// Identity hash of the referenced block
    pub fn hash(&self) -> BlockHash {
        match self {
            BlockRef::Hash(hash) => *hash,
            BlockRef::Block(block) => block.hash(),
        }
    }
}

impl From<BlockHash> for BlockRef<'static> {
    fn from(hash: BlockHash) -> Self {
        BlockRef::Hash(hash)
    }
}

impl<'a> From<&'a Block> for BlockRef<'a> {
    fn from(block: &'a Block) -> Self {
        BlockRef::Block(block)
    }
}

/// Chain database layered over [`Database`].
///
/// Owns the block and transaction tables and every index derived from them.
/// Within one `save_block` the primary write completes before either index
/// write is issued, so a reader following an index never reaches a hash the
/// block table does not hold.
pub struct ChainDb {
    db: Database,
}

impl ChainDb {
    /// Create a new chain database over an opened [`Database`]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get the underlying database
    pub fn database(&self) -> &Database {
        &self.db
    }

    // ========== Blocks ==========

    /// Persist a block and maintain its index entries.
    ///
    /// Write order: block record, then height index (active blocks only),
    /// then prev-hash index. Only active blocks are indexed by height, which
    /// keeps the height index holding at most one hash per height; the
    /// prev-hash index is written for every block so forks stay reachable.
    pub fn save_block(&self, block: &Block) -> StorageResult<BlockHash> {
        let height_key = keys::height_key(block.height)?;
        let hash = block.hash();
        let data = codec::encode_block(block);

        self.db.put(cf::BLOCKS, hash.as_bytes(), &data)?;
        if block.active {
            self.db
                .put(cf::BLOCK_HEIGHT_INDEX, &height_key, hash.as_bytes())?;
        }
        self.db
            .put(cf::BLOCK_PREV_INDEX, block.prev_hash.as_bytes(), hash.as_bytes())?;

        debug!(height = block.height, active = block.active, %hash, "stored block");
        Ok(hash)
    }

    /// Retrieve a block by hash
    pub fn get_block_by_hash(&self, hash: &BlockHash) -> StorageResult<Option<Block>> {
        match self.db.get(cf::BLOCKS, hash.as_bytes())? {
            Some(bytes) => Ok(Some(decode_block_record(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Retrieve many blocks in one engine round trip.
    ///
    /// Results preserve the order of the requested hashes; hashes with no
    /// stored block are omitted, so the result may be shorter than the input.
    pub fn get_blocks_by_hashes(&self, hashes: &[BlockHash]) -> StorageResult<Vec<Block>> {
        let rows = self.db.multi_get(cf::BLOCKS, hashes)?;
        let mut blocks = Vec::with_capacity(rows.len());
        for row in rows.into_iter().flatten() {
            blocks.push(decode_block_record(&row)?);
        }
        Ok(blocks)
    }

    /// Retrieve the active block at the given height
    pub fn get_block_by_height(&self, height: u64) -> StorageResult<Option<Block>> {
        let key = keys::height_key(height)?;
        let Some(hash_bytes) = self.db.get(cf::BLOCK_HEIGHT_INDEX, &key)? else {
            return Ok(None);
        };
        let hash = hash_from_index(&hash_bytes)?;
        self.resolve_indexed_block(&hash).map(Some)
    }

    /// Retrieve the active blocks at the given heights, in input order,
    /// omitting heights with no active block.
    pub fn get_blocks_by_heights(&self, heights: &[u64]) -> StorageResult<Vec<Block>> {
        let mut height_keys = Vec::with_capacity(heights.len());
        for height in heights {
            height_keys.push(keys::height_key(*height)?);
        }

        let rows = self.db.multi_get(cf::BLOCK_HEIGHT_INDEX, &height_keys)?;
        let mut hashes = Vec::with_capacity(rows.len());
        for row in rows.into_iter().flatten() {
            hashes.push(hash_from_index(&row)?);
        }
        self.get_blocks_by_hashes(&hashes)
    }

    /// Retrieve the most recently saved successor of the given block.
    ///
    /// Fork points have several successors; the index keeps only the latest
    /// writer, so callers needing full fork enumeration must track it
    /// elsewhere.
    pub fn get_block_by_prev<'a>(
        &self,
        parent: impl Into<BlockRef<'a>>,
    ) -> StorageResult<Option<Block>> {
        let parent_hash = parent.into().hash();
        let Some(hash_bytes) = self.db.get(cf::BLOCK_PREV_INDEX, parent_hash.as_bytes())? else {
            return Ok(None);
        };
        let hash = hash_from_index(&hash_bytes)?;
        self.resolve_indexed_block(&hash).map(Some)
    }

    /// Retrieve the block at the highest stored height.
    ///
    /// Reads the tail of the height-ordered index instead of scanning the
    /// block table. Fails with [`StorageError::EmptyStore`] when nothing has
    /// been indexed yet.
    pub fn get_top_block(&self) -> StorageResult<Block> {
        let Some((_key, hash_bytes)) = self.db.last(cf::BLOCK_HEIGHT_INDEX)? else {
            return Err(StorageError::EmptyStore);
        };
        let hash = hash_from_index(&hash_bytes)?;
        self.resolve_indexed_block(&hash)
    }

    /// Find the best block to continue synchronization from.
    ///
    /// A locator is an ordered list of candidate hashes supplied by a sync
    /// peer. Among the candidates that exist and are on the active chain, the
    /// one with the greatest height wins; locator position is ignored so an
    /// out-of-order locator cannot skew the result. Heights are unique among
    /// active blocks, so there is no tie to break.
    pub fn get_block_by_locator(&self, locator: &[BlockHash]) -> StorageResult<Option<Block>> {
        let blocks = self.get_blocks_by_hashes(locator)?;
        let mut highest: Option<Block> = None;
        for block in blocks {
            if !block.active {
                continue;
            }
            match &highest {
                Some(best) if block.height <= best.height => {}
                _ => highest = Some(block),
            }
        }
        Ok(highest)
    }

    /// Check whether a block is stored
    pub fn block_exists(&self, hash: &BlockHash) -> StorageResult<bool> {
        Ok(self.db.get(cf::BLOCKS, hash.as_bytes())?.is_some())
    }

    // ========== Transactions ==========

    /// Persist a single transaction
    pub fn save_transaction(&self, tx: &Transaction) -> StorageResult<TxHash> {
        let hash = tx.hash();
        self.db
            .put(cf::TRANSACTIONS, hash.as_bytes(), &codec::encode_transaction(tx))?;
        Ok(hash)
    }

    /// Persist a group of transactions in one engine write.
    ///
    /// This is a convenience over per-record writes, not a transaction: no
    /// atomicity across records is promised to callers.
    pub fn save_transactions(&self, txs: &[Transaction]) -> StorageResult<()> {
        let mut batch = self.db.batch();
        for tx in txs {
            batch.put(
                cf::TRANSACTIONS,
                tx.hash().as_bytes(),
                &codec::encode_transaction(tx),
            );
        }
        self.db.write_batch(batch)
    }

    /// Retrieve a transaction by hash
    pub fn get_transaction_by_hash(&self, hash: &TxHash) -> StorageResult<Option<Transaction>> {
        match self.db.get(cf::TRANSACTIONS, hash.as_bytes())? {
            Some(bytes) => Ok(Some(decode_tx_record(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Retrieve many transactions in one engine round trip; same ordering
    /// and omission rules as [`get_blocks_by_hashes`](Self::get_blocks_by_hashes).
    pub fn get_transactions_by_hashes(&self, hashes: &[TxHash]) -> StorageResult<Vec<Transaction>> {
        let rows = self.db.multi_get(cf::TRANSACTIONS, hashes)?;
        let mut txs = Vec::with_capacity(rows.len());
        for row in rows.into_iter().flatten() {
            txs.push(decode_tx_record(&row)?);
        }
        Ok(txs)
    }

    /// Check whether a transaction is stored
    pub fn transaction_exists(&self, hash: &TxHash) -> StorageResult<bool> {
        Ok(self.db.get(cf::TRANSACTIONS, hash.as_bytes())?.is_some())
    }

    // ========== Unimplemented index surfaces ==========

    /// Output references affected by the given transaction.
    ///
    /// The backing index is declared but never populated; the call fails
    /// rather than answering from an empty table.
    pub fn get_tx_affects(&self, _tx_hash: &TxHash) -> StorageResult<Vec<OutPoint>> {
        Err(StorageError::NotImplemented("tx-affects index"))
    }

    /// Count stored transactions spending any of the given outputs.
    pub fn count_conflicting_transactions(&self, _spent: &[OutPoint]) -> StorageResult<u64> {
        Err(StorageError::NotImplemented("conflict detection"))
    }

    /// Retrieve stored transactions spending any of the given outputs.
    pub fn get_conflicting_transactions(
        &self,
        _spent: &[OutPoint],
    ) -> StorageResult<Vec<Transaction>> {
        Err(StorageError::NotImplemented("conflict detection"))
    }

    // ========== Maintenance ==========

    /// Remove every record and index entry
    pub fn clear(&self) -> StorageResult<()> {
        self.db.clear_all()?;
        info!("cleared chain store");
        Ok(())
    }

    /// Resolve a hash obtained from an index through the block table.
    ///
    /// Index entries are written after their block record, so an entry whose
    /// hash is absent from the primary table is storage corruption, not a
    /// miss.
    fn resolve_indexed_block(&self, hash: &BlockHash) -> StorageResult<Block> {
        match self.db.get(cf::BLOCKS, hash.as_bytes())? {
            Some(bytes) => decode_block_record(&bytes),
            None => Err(StorageError::Corrupted(format!(
                "index entry {hash} has no block record"
            ))),
        }
    }
}

fn decode_block_record(bytes: &[u8]) -> StorageResult<Block> {
    codec::decode_block(bytes)
        .ok_or_else(|| StorageError::Corrupted("block record failed to decode".into()))
}

fn decode_tx_record(bytes: &[u8]) -> StorageResult<Transaction> {
    codec::decode_transaction(bytes)
        .ok_or_else(|| StorageError::Corrupted("transaction record failed to decode".into()))
}

fn hash_from_index(bytes: &[u8]) -> StorageResult<BlockHash> {
    BlockHash::from_slice(bytes)
        .map_err(|e| StorageError::Corrupted(format!("index entry is not a hash: {e}")))
}

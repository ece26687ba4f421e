//! RocksDB wrapper

use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Column family names
pub mod cf {
    /// Block records keyed by block hash
    pub const BLOCKS: &str = "blocks";
    /// Transaction records keyed by transaction hash
    pub const TRANSACTIONS: &str = "transactions";
    /// Block height to active block hash
    pub const BLOCK_HEIGHT_INDEX: &str = "block_height_index";
    /// Previous-block hash to successor block hash
    pub const BLOCK_PREV_INDEX: &str = "block_prev_index";
    /// Transaction hash to affected output references (reserved, unpopulated)
    pub const TX_AFFECTS_INDEX: &str = "tx_affects_index";
    /// Metadata
    pub const META: &str = "meta";
}

/// All column family names
pub const ALL_CFS: &[&str] = &[
    cf::BLOCKS,
    cf::TRANSACTIONS,
    cf::BLOCK_HEIGHT_INDEX,
    cf::BLOCK_PREV_INDEX,
    cf::TX_AFFECTS_INDEX,
    cf::META,
];

type RocksDB = DBWithThreadMode<MultiThreaded>;

/// Database configuration
#[derive(Clone, Debug)]
pub struct DbConfig {
    /// Create database if missing
    pub create_if_missing: bool,
    /// Maximum number of open files
    pub max_open_files: i32,
    /// Write buffer size
    pub write_buffer_size: usize,
    /// Maximum write buffers
    pub max_write_buffer_number: i32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            max_open_files: 512,
            write_buffer_size: 64 * 1024 * 1024, // 64MB
            max_write_buffer_number: 3,
        }
    }
}

/// RocksDB wrapper with column family support.
///
/// A single handle per database directory is shared by all callers; clones
/// point at the same underlying connection.
pub struct Database {
    db: Arc<RwLock<Option<RocksDB>>>,
    path: String,
}

impl Database {
    /// Create a new database instance (not yet opened)
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            db: Arc::new(RwLock::new(None)),
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// Open the database with default config
    pub fn open(&self) -> StorageResult<()> {
        self.open_with_config(DbConfig::default())
    }

    /// Open the database with custom config.
    ///
    /// Opening an already-open database is a no-op; the existing connection
    /// keeps its original configuration.
    pub fn open_with_config(&self, config: DbConfig) -> StorageResult<()> {
        let mut db_guard = self.db.write();
        if db_guard.is_some() {
            debug!(path = %self.path, "database already open");
            return Ok(());
        }

        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(config.max_open_files);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = RocksDB::open_cf_descriptors(&opts, &self.path, cf_descriptors)?;
        *db_guard = Some(db);
        info!(path = %self.path, "opened chain database");
        Ok(())
    }

    /// Close the database
    pub fn close(&self) {
        let mut db_guard = self.db.write();
        *db_guard = None;
    }

    /// Check if database is open
    pub fn is_open(&self) -> bool {
        self.db.read().is_some()
    }

    /// Destroy the database files at the given path.
    ///
    /// The database must not be open.
    pub fn destroy(path: impl AsRef<Path>) -> StorageResult<()> {
        RocksDB::destroy(&Options::default(), path.as_ref())?;
        Ok(())
    }

    /// Get a value from a column family
    pub fn get(&self, cf_name: &str, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or(StorageError::NotOpen)?;
        let cf = self.get_cf(db, cf_name)?;
        Ok(db.get_cf(&cf, key)?)
    }

    /// Put a value to a column family
    pub fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or(StorageError::NotOpen)?;
        let cf = self.get_cf(db, cf_name)?;
        db.put_cf(&cf, key, value)?;
        Ok(())
    }

    /// Delete a value from a column family
    pub fn delete(&self, cf_name: &str, key: &[u8]) -> StorageResult<()> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or(StorageError::NotOpen)?;
        let cf = self.get_cf(db, cf_name)?;
        db.delete_cf(&cf, key)?;
        Ok(())
    }

    /// Fetch many keys from a column family in one engine round trip.
    ///
    /// The result preserves input order, with `None` for absent keys. Any
    /// per-key engine error fails the whole batch.
    pub fn multi_get<K: AsRef<[u8]>>(
        &self,
        cf_name: &str,
        keys: &[K],
    ) -> StorageResult<Vec<Option<Vec<u8>>>> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or(StorageError::NotOpen)?;
        let cf = self.get_cf(db, cf_name)?;
        db.multi_get_cf(keys.iter().map(|key| (&cf, key.as_ref())))
            .into_iter()
            .map(|entry| entry.map_err(StorageError::from))
            .collect()
    }

    /// Read the entry with the highest key in a column family.
    ///
    /// This is the one ordered-traversal primitive the store relies on; it is
    /// only meaningful for column families whose key encoding sorts the way
    /// the caller expects.
    pub fn last(&self, cf_name: &str) -> StorageResult<Option<(Vec<u8>, Vec<u8>)>> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or(StorageError::NotOpen)?;
        let cf = self.get_cf(db, cf_name)?;
        match db.iterator_cf(&cf, IteratorMode::End).next() {
            Some(Ok((key, value))) => Ok(Some((key.into_vec(), value.into_vec()))),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Remove every entry from a column family
    pub fn clear(&self, cf_name: &str) -> StorageResult<()> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or(StorageError::NotOpen)?;
        // Resolve first so an unknown name reports InvalidColumnFamily.
        drop(self.get_cf(db, cf_name)?);
        db.drop_cf(cf_name)?;
        db.create_cf(cf_name, &Options::default())?;
        Ok(())
    }

    /// Remove every entry from every column family
    pub fn clear_all(&self) -> StorageResult<()> {
        for cf_name in ALL_CFS {
            self.clear(cf_name)?;
        }
        Ok(())
    }

    /// Create a write batch
    pub fn batch(&self) -> WriteBatchWrapper {
        WriteBatchWrapper::new()
    }

    /// Execute a write batch.
    ///
    /// Entries are applied together as one engine write; callers must not
    /// rely on cross-entry atomicity beyond what the engine provides.
    pub fn write_batch(&self, batch: WriteBatchWrapper) -> StorageResult<()> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or(StorageError::NotOpen)?;

        let mut rocks_batch = WriteBatch::default();
        for op in batch.operations {
            match op {
                BatchOp::Put {
                    cf_name,
                    key,
                    value,
                } => {
                    let cf = self.get_cf(db, &cf_name)?;
                    rocks_batch.put_cf(&cf, &key, &value);
                }
                BatchOp::Delete { cf_name, key } => {
                    let cf = self.get_cf(db, &cf_name)?;
                    rocks_batch.delete_cf(&cf, &key);
                }
            }
        }

        db.write(rocks_batch)?;
        Ok(())
    }

    /// Get column family handle
    fn get_cf<'a>(
        &self,
        db: &'a RocksDB,
        name: &str,
    ) -> StorageResult<Arc<BoundColumnFamily<'a>>> {
        db.cf_handle(name)
            .ok_or_else(|| StorageError::InvalidColumnFamily(name.to_string()))
    }

    /// Get database path
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            path: self.path.clone(),
        }
    }
}

/// Batch operation
enum BatchOp {
    Put {
        cf_name: String,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        cf_name: String,
        key: Vec<u8>,
    },
}

/// Write batch wrapper
pub struct WriteBatchWrapper {
    operations: Vec<BatchOp>,
}

impl WriteBatchWrapper {
    /// Create a new write batch
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
        }
    }

    /// Add a put operation
    pub fn put(&mut self, cf_name: &str, key: &[u8], value: &[u8]) {
        self.operations.push(BatchOp::Put {
            cf_name: cf_name.to_string(),
            key: key.to_vec(),
            value: value.to_vec(),
        });
    }

    /// Add a delete operation
    pub fn delete(&mut self, cf_name: &str, key: &[u8]) {
        self.operations.push(BatchOp::Delete {
            cf_name: cf_name.to_string(),
            key: key.to_vec(),
        });
    }

    /// Get number of operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if batch is empty
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl Default for WriteBatchWrapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_db_path() -> String {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let cnt = COUNTER.fetch_add(1, Ordering::SeqCst);
        format!("/tmp/ember_db_test_{}_{}", id, cnt)
    }

    fn cleanup(path: &str) {
        let _ = fs::remove_dir_all(path);
    }

    #[test]
    fn test_open_close() {
        let path = temp_db_path();
        let db = Database::new(&path);

        assert!(!db.is_open());
        db.open().unwrap();
        assert!(db.is_open());
        db.close();
        assert!(!db.is_open());

        cleanup(&path);
    }

    #[test]
    fn test_open_is_idempotent() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        db.put(cf::META, b"key", b"value").unwrap();
        db.open().unwrap();
        assert_eq!(db.get(cf::META, b"key").unwrap(), Some(b"value".to_vec()));

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_put_get() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        db.put(cf::BLOCKS, b"key1", b"value1").unwrap();
        let value = db.get(cf::BLOCKS, b"key1").unwrap();
        assert_eq!(value, Some(b"value1".to_vec()));

        let missing = db.get(cf::BLOCKS, b"missing").unwrap();
        assert_eq!(missing, None);

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_delete() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        db.put(cf::TRANSACTIONS, b"tx1", b"raw").unwrap();
        assert!(db.get(cf::TRANSACTIONS, b"tx1").unwrap().is_some());

        db.delete(cf::TRANSACTIONS, b"tx1").unwrap();
        assert!(db.get(cf::TRANSACTIONS, b"tx1").unwrap().is_none());

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_multi_get_preserves_order_and_misses() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        db.put(cf::BLOCKS, b"a", b"1").unwrap();
        db.put(cf::BLOCKS, b"c", b"3").unwrap();

        let results = db
            .multi_get(cf::BLOCKS, &[b"a".as_slice(), b"b", b"c"])
            .unwrap();
        assert_eq!(
            results,
            vec![Some(b"1".to_vec()), None, Some(b"3".to_vec())]
        );

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_write_batch() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        let mut batch = db.batch();
        batch.put(cf::TRANSACTIONS, b"tx1", b"data1");
        batch.put(cf::TRANSACTIONS, b"tx2", b"data2");
        batch.delete(cf::TRANSACTIONS, b"tx3");

        assert_eq!(batch.len(), 3);
        db.write_batch(batch).unwrap();

        assert_eq!(
            db.get(cf::TRANSACTIONS, b"tx1").unwrap(),
            Some(b"data1".to_vec())
        );
        assert_eq!(
            db.get(cf::TRANSACTIONS, b"tx2").unwrap(),
            Some(b"data2".to_vec())
        );

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_last_empty() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        assert!(db.last(cf::BLOCK_HEIGHT_INDEX).unwrap().is_none());

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_last_returns_highest_key() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        db.put(cf::BLOCK_HEIGHT_INDEX, &[0, 0, 0, 9], b"nine")
            .unwrap();
        db.put(cf::BLOCK_HEIGHT_INDEX, &[0, 0, 0, 1], b"one")
            .unwrap();
        db.put(cf::BLOCK_HEIGHT_INDEX, &[0, 0, 0, 2], b"two")
            .unwrap();

        let (key, value) = db.last(cf::BLOCK_HEIGHT_INDEX).unwrap().unwrap();
        assert_eq!(key, vec![0, 0, 0, 9]);
        assert_eq!(value, b"nine".to_vec());

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_clear() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        db.put(cf::BLOCKS, b"key1", b"value1").unwrap();
        db.put(cf::BLOCKS, b"key2", b"value2").unwrap();
        db.clear(cf::BLOCKS).unwrap();

        assert!(db.get(cf::BLOCKS, b"key1").unwrap().is_none());
        assert!(db.get(cf::BLOCKS, b"key2").unwrap().is_none());

        // Cleared column family stays usable.
        db.put(cf::BLOCKS, b"key3", b"value3").unwrap();
        assert!(db.get(cf::BLOCKS, b"key3").unwrap().is_some());

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_clear_all() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        for cf_name in ALL_CFS {
            db.put(cf_name, b"key", b"value").unwrap();
        }
        db.clear_all().unwrap();
        for cf_name in ALL_CFS {
            assert!(db.get(cf_name, b"key").unwrap().is_none());
        }

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_not_open_errors() {
        let db = Database::new("/tmp/ember_not_opened");
        assert!(matches!(
            db.get(cf::BLOCKS, b"key"),
            Err(StorageError::NotOpen)
        ));
        assert!(matches!(
            db.put(cf::BLOCKS, b"key", b"value"),
            Err(StorageError::NotOpen)
        ));
        assert!(matches!(
            db.multi_get(cf::BLOCKS, &[b"key"]),
            Err(StorageError::NotOpen)
        ));
        assert!(matches!(
            db.last(cf::BLOCK_HEIGHT_INDEX),
            Err(StorageError::NotOpen)
        ));
        assert!(matches!(db.clear_all(), Err(StorageError::NotOpen)));
    }

    #[test]
    fn test_reopen_persists_data() {
        let path = temp_db_path();
        let db = Database::new(&path);

        db.open().unwrap();
        db.put(cf::BLOCKS, b"key1", b"value1").unwrap();
        db.close();

        db.open().unwrap();
        assert_eq!(db.get(cf::BLOCKS, b"key1").unwrap(), Some(b"value1".to_vec()));

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_destroy() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();
        db.put(cf::BLOCKS, b"key1", b"value1").unwrap();
        db.close();

        Database::destroy(&path).unwrap();

        let db = Database::new(&path);
        db.open().unwrap();
        assert!(db.get(cf::BLOCKS, b"key1").unwrap().is_none());
        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_column_family_isolation() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        db.put(cf::BLOCKS, b"same_key", b"block").unwrap();
        db.put(cf::TRANSACTIONS, b"same_key", b"tx").unwrap();

        assert_eq!(db.get(cf::BLOCKS, b"same_key").unwrap(), Some(b"block".to_vec()));
        assert_eq!(
            db.get(cf::TRANSACTIONS, b"same_key").unwrap(),
            Some(b"tx".to_vec())
        );

        db.delete(cf::BLOCKS, b"same_key").unwrap();
        assert!(db.get(cf::BLOCKS, b"same_key").unwrap().is_none());
        assert!(db.get(cf::TRANSACTIONS, b"same_key").unwrap().is_some());

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_database_clone_shares_connection() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        let db_clone = db.clone();
        db.put(cf::META, b"key1", b"value1").unwrap();
        assert_eq!(db_clone.get(cf::META, b"key1").unwrap(), Some(b"value1".to_vec()));

        db.close();
        cleanup(&path);
    }
}

//! Storage error types

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// RocksDB error
    #[error("rocksdb error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Database not open
    #[error("database not open")]
    NotOpen,

    /// Invalid column family
    #[error("invalid column family: {0}")]
    InvalidColumnFamily(String),

    /// Block height does not fit the 32-bit index key space
    #[error("block height {height} exceeds the index key space")]
    HeightOutOfRange {
        /// The rejected height
        height: u64,
    },

    /// A stored record failed to decode
    #[error("corrupted record: {0}")]
    Corrupted(String),

    /// Cursor operation on an empty index
    #[error("store is empty")]
    EmptyStore,

    /// Operation is declared but not implemented
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

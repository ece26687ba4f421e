//! # ember-storage
//!
//! Indexed block/transaction store for Emberchain, backed by RocksDB.
//!
//! This crate provides:
//! - [`Database`] - the key-value engine binding (column families, batched
//!   reads/writes, ordered tail access)
//! - [`ChainDb`] - block and transaction tables with height and prev-hash
//!   indexes, batched lookups, locator resolution and chain-tip access
//! - [`StorageError`] - the error taxonomy shared by both layers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod db;
pub mod error;
pub mod keys;

pub use chain::{BlockRef, ChainDb};
pub use db::{Database, DbConfig, WriteBatchWrapper};
pub use error::{StorageError, StorageResult};

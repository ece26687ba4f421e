//! # ember-types
//!
//! Core blockchain types for Emberchain.
//!
//! This crate provides:
//! - [`Block`](block::Block) - Block metadata with its transaction hash list
//! - [`Transaction`](transaction::Transaction) - Parsed transactions and the
//!   canonical payload parser
//! - [`codec`] - Deterministic record encoding used by the storage layer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block;
pub mod codec;
pub mod transaction;

// Re-export commonly used types
pub use block::Block;
pub use transaction::{OutPoint, Transaction, TxIn, TxOut};

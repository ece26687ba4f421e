//! # ember-primitives
//!
//! Primitive types for Emberchain.
//!
//! This crate provides:
//! - [`H256`](hash::H256) - 256-bit hash with [`BlockHash`](hash::BlockHash)
//!   and [`TxHash`](hash::TxHash) aliases
//! - [`ChainWork`](work::ChainWork) - arbitrary-precision cumulative
//!   proof-of-work value

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod hash;
pub mod work;

pub use hash::{BlockHash, H256, HashError, TxHash};
pub use work::ChainWork;

//! # ember-crypto
//!
//! Hashing primitives for Emberchain.
//!
//! - SHA-256 hashing
//! - Double SHA-256 (the block/transaction identity hash)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod hash;

pub use hash::{sha256, sha256d};

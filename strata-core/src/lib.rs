//! # Strata Core
//!
//! Core types, hashing, and serialization for the Strata protocol.
//!
//! This crate provides the foundation for the other Strata crates:
//! - Block structure and Merkle tree computation
//! - SHA-256 hashing utilities
//! - Deterministic binary serialization

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod block;
pub mod error;
pub mod hashing;
pub mod serialization;

// Re-export commonly used types at crate root
pub use block::{Block, BlockHeader};
pub use error::SerializationError;
pub use hashing::{merkle_root, sha256, sha256_concat};

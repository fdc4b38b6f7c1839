//! Wire encoding for the Strata protocol.
//!
//! Everything that crosses the wire or gets hashed — block headers, sync
//! requests, chunk payloads — goes through bincode pinned to a single
//! configuration: fixed-width integers, little-endian byte order, trailing
//! bytes rejected. Block hashes and chunk roots are digests of these bytes,
//! so the layout must never vary with the value or the platform.

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::SerializationError;

/// The pinned bincode configuration all protocol bytes use.
fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Encode a value into its canonical wire bytes.
pub fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    wire_options()
        .serialize(value)
        .map_err(|e| SerializationError::EncodeFailed(e.to_string()))
}

/// Decode a value from wire bytes.
///
/// Fails on malformed input, a type mismatch, or bytes left over after the
/// value: a payload must be consumed exactly.
pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    wire_options()
        .deserialize(bytes)
        .map_err(|e| SerializationError::DecodeFailed(e.to_string()))
}

/// Wire size of a value, computed without encoding it.
pub fn serialized_size<T: Serialize>(value: &T) -> Result<u64, SerializationError> {
    wire_options()
        .serialized_size(value)
        .map_err(|e| SerializationError::EncodeFailed(e.to_string()))
}

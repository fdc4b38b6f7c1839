//! Sync protocol messages.
//!
//! This module defines the four message types exchanged during chunked
//! synchronization, plus the transport topics they travel on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport topics used by the sync protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Ask peers to enumerate forward chunks from a tail hash.
    ChainSync,
    /// Answer to `ChainSync`: a `ChunkHeaders` set.
    ChainChunkHeaders,
    /// Request the payload for one chunk header.
    ChainGetChunk,
    /// Answer to `ChainGetChunk`: a `ChunkData`.
    ChainChunkData,
}

impl Topic {
    /// Get the wire name for this topic.
    pub fn name(&self) -> &'static str {
        match self {
            Topic::ChainSync => "chainsync",
            Topic::ChainChunkHeaders => "chainchunkheaders",
            Topic::ChainGetChunk => "chaingetchunk",
            Topic::ChainChunkData => "chainchunkdata",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Request for forward chunks, anchored at the sender's tail block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncRequest {
    /// Hash of the block the peer should enumerate forward from.
    pub tail_block_hash: [u8; 32],
}

/// Merkle commitment over one contiguous batch of block hashes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Merkle root of the block hashes in this chunk.
    pub root: [u8; 32],
    /// Ordered block hashes forming the chunk.
    pub headers: Vec<[u8; 32]>,
}

/// An ordered sequence of successive chunks a peer can serve.
///
/// Two peers that agree on the canonical chain from the requested tail
/// produce an identical `root`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkHeaders {
    /// Merkle root committing to the whole sequence of chunk roots.
    pub root: [u8; 32],
    /// The chunk headers, in chain order.
    pub chunk_headers: Vec<ChunkHeader>,
}

impl ChunkHeaders {
    /// Hex encoding of the root, used as the identity key when tallying votes.
    pub fn root_hex(&self) -> String {
        hex::encode(self.root)
    }
}

/// Payload for exactly one chunk header, matched by `root`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkData {
    /// Root of the chunk header this payload answers.
    pub root: [u8; 32],
    /// Serialized blocks forming the chunk.
    pub blocks: Vec<Vec<u8>>,
}

impl fmt::Display for SyncRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SyncRequest(tail={:02x?})", &self.tail_block_hash[..8])
    }
}

impl fmt::Display for ChunkHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChunkHeaders(root={:02x?}, chunks={})",
            &self.root[..8],
            self.chunk_headers.len()
        )
    }
}

impl fmt::Display for ChunkData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChunkData(root={:02x?}, blocks={})",
            &self.root[..8],
            self.blocks.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::serialization::{deserialize, serialize};

    #[test]
    fn test_topic_names() {
        assert_eq!(Topic::ChainSync.name(), "chainsync");
        assert_eq!(Topic::ChainGetChunk.name(), "chaingetchunk");
        assert_eq!(format!("{}", Topic::ChainChunkData), "chainchunkdata");
    }

    #[test]
    fn test_sync_request_roundtrip() {
        let request = SyncRequest {
            tail_block_hash: [7u8; 32],
        };

        let bytes = serialize(&request).unwrap();
        let recovered: SyncRequest = deserialize(&bytes).unwrap();
        assert_eq!(request, recovered);
    }

    #[test]
    fn test_chunk_headers_roundtrip() {
        let headers = ChunkHeaders {
            root: [1u8; 32],
            chunk_headers: vec![ChunkHeader {
                root: [2u8; 32],
                headers: vec![[3u8; 32], [4u8; 32]],
            }],
        };

        let bytes = serialize(&headers).unwrap();
        let recovered: ChunkHeaders = deserialize(&bytes).unwrap();
        assert_eq!(headers, recovered);
    }

    #[test]
    fn test_root_hex() {
        let headers = ChunkHeaders {
            root: [0xAB; 32],
            chunk_headers: Vec::new(),
        };
        assert_eq!(headers.root_hex(), "ab".repeat(32));
    }

    #[test]
    fn test_display() {
        let data = ChunkData {
            root: [0u8; 32],
            blocks: vec![vec![1, 2, 3]],
        };
        assert!(format!("{}", data).contains("blocks=1"));
    }
}

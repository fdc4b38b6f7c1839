//! Chunk generation and application.
//!
//! [`ChunkService`] is the chain-facing half of the sync protocol: it answers
//! `ChainSync` requests by enumerating forward chunks, serves chunk payloads
//! for `ChainGetChunk`, and applies downloaded chunks to the local chain.

use strata_core::serialization::{deserialize, serialize};
use strata_core::Block;

use crate::chain::{ChunkProcessor, SharedChain};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::messages::{ChunkData, ChunkHeader, ChunkHeaders};

/// Decode the serialized blocks carried by a chunk payload.
pub fn decode_blocks(data: &ChunkData) -> SyncResult<Vec<Block>> {
    data.blocks
        .iter()
        .map(|bytes| deserialize::<Block>(bytes).map_err(SyncError::from))
        .collect()
}

/// Serves and applies chunks over a shared chain.
pub struct ChunkService {
    chain: SharedChain,
    chunk_size: u64,
    max_chunks: usize,
}

impl ChunkService {
    /// Create a chunk service over the given chain.
    pub fn new(chain: SharedChain, config: &SyncConfig) -> Self {
        Self {
            chain,
            chunk_size: config.chunk_size,
            max_chunks: config.max_chunks_per_sync,
        }
    }

    /// Enumerate forward chunks starting after the given block.
    ///
    /// Only whole chunks are served; a trailing partial chunk is left for the
    /// requester's next round, once its tail has advanced. A requester already
    /// at (or within one chunk of) our tip gets an empty set, which tells it
    /// the sync is complete.
    pub fn generate_chunk_headers(&self, from_hash: &[u8; 32]) -> SyncResult<ChunkHeaders> {
        let chain = self.chain.read();

        let from = chain
            .get_block(from_hash)
            .ok_or_else(|| SyncError::UnknownBlock(hex::encode(from_hash)))?;

        let mut chunk_headers = Vec::new();
        let mut height = from.height() + 1;

        while chunk_headers.len() < self.max_chunks {
            let end = height + self.chunk_size - 1;
            if end > chain.height() {
                break;
            }

            let mut headers = Vec::with_capacity(self.chunk_size as usize);
            for h in height..=end {
                match chain.hash_at_height(h) {
                    Some(hash) => headers.push(hash),
                    None => return Err(SyncError::UnknownBlock(format!("height {}", h))),
                }
            }

            chunk_headers.push(ChunkHeader {
                root: strata_core::merkle_root(&headers),
                headers,
            });
            height = end + 1;
        }

        let roots: Vec<[u8; 32]> = chunk_headers.iter().map(|c| c.root).collect();
        Ok(ChunkHeaders {
            root: strata_core::merkle_root(&roots),
            chunk_headers,
        })
    }

    /// Serialize the blocks matching a chunk header.
    pub fn generate_chunk_data(&self, header: &ChunkHeader) -> SyncResult<ChunkData> {
        let chain = self.chain.read();

        let mut blocks = Vec::with_capacity(header.headers.len());
        for hash in &header.headers {
            let block = chain
                .get_block(hash)
                .ok_or_else(|| SyncError::UnknownBlock(hex::encode(hash)))?;
            blocks.push(serialize(block)?);
        }

        Ok(ChunkData {
            root: header.root,
            blocks,
        })
    }
}

impl ChunkProcessor for ChunkService {
    fn process_chunk(&self, data: &ChunkData) -> SyncResult<()> {
        let blocks = decode_blocks(data)?;
        self.chain
            .write()
            .append_chunk(blocks)
            .map_err(|e| SyncError::ChunkApply(e.to_string()))
    }
}

//! Chunk verification.
//!
//! The sync task validates everything peers hand it before acting on it:
//! chunk header sets when tallying votes, and chunk payloads before they are
//! applied. Verification is pure and injected as a capability so the task
//! itself stays independent of the chain's commitment scheme.

use strata_core::merkle_root;

use crate::chunk::decode_blocks;
use crate::error::{SyncError, SyncResult};
use crate::messages::{ChunkData, ChunkHeader, ChunkHeaders};

/// Validates chunk header sets and chunk payloads.
pub trait ChunkVerifier: Send + Sync {
    /// Check that a chunk header set is internally consistent.
    fn verify_chunk_headers(&self, headers: &ChunkHeaders) -> SyncResult<()>;

    /// Check that a chunk payload reproduces its header's commitment.
    fn verify_chunk_data(&self, header: &ChunkHeader, data: &ChunkData) -> SyncResult<()>;
}

/// Default verifier checking the Merkle commitments of the sync protocol.
pub struct MerkleVerifier;

impl ChunkVerifier for MerkleVerifier {
    fn verify_chunk_headers(&self, headers: &ChunkHeaders) -> SyncResult<()> {
        for (i, chunk) in headers.chunk_headers.iter().enumerate() {
            if chunk.headers.is_empty() {
                return Err(SyncError::Verification(format!("chunk {} is empty", i)));
            }
            if chunk.root != merkle_root(&chunk.headers) {
                return Err(SyncError::Verification(format!(
                    "chunk {} root does not match its block hashes",
                    i
                )));
            }
        }

        let roots: Vec<[u8; 32]> = headers.chunk_headers.iter().map(|c| c.root).collect();
        if headers.root != merkle_root(&roots) {
            return Err(SyncError::Verification(
                "set root does not match chunk roots".into(),
            ));
        }

        Ok(())
    }

    fn verify_chunk_data(&self, header: &ChunkHeader, data: &ChunkData) -> SyncResult<()> {
        if data.root != header.root {
            return Err(SyncError::Verification("payload root mismatch".into()));
        }

        if data.blocks.len() != header.headers.len() {
            return Err(SyncError::Verification(format!(
                "expected {} blocks, got {}",
                header.headers.len(),
                data.blocks.len()
            )));
        }

        let blocks = decode_blocks(data)?;

        let mut prev_hash: Option<[u8; 32]> = None;
        for (i, block) in blocks.iter().enumerate() {
            let hash = block.hash();
            if hash != header.headers[i] {
                return Err(SyncError::Verification(format!(
                    "block {} does not match committed hash",
                    i
                )));
            }
            if !block.verify_tx_root() {
                return Err(SyncError::Verification(format!(
                    "block {} has an invalid tx root",
                    i
                )));
            }
            if let Some(prev) = prev_hash {
                if block.header.prev_block_hash != prev {
                    return Err(SyncError::Verification(format!(
                        "block {} does not link to its predecessor",
                        i
                    )));
                }
            }
            prev_hash = Some(hash);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::serialization::serialize;
    use strata_core::{Block, BlockHeader};

    /// Build a run of linked empty blocks starting at the given height.
    fn linked_blocks(start_height: u64, count: usize) -> Vec<Block> {
        let mut blocks: Vec<Block> = Vec::with_capacity(count);
        let mut prev_hash = [0xAA; 32];

        for i in 0..count {
            let block = Block {
                header: BlockHeader {
                    version: BlockHeader::VERSION,
                    height: start_height + i as u64,
                    timestamp: 1700000000 + i as u64,
                    prev_block_hash: prev_hash,
                    tx_root: [0u8; 32],
                },
                transactions: Vec::new(),
            };
            prev_hash = block.hash();
            blocks.push(block);
        }

        blocks
    }

    fn chunk_for(blocks: &[Block]) -> (ChunkHeader, ChunkData) {
        let hashes: Vec<[u8; 32]> = blocks.iter().map(|b| b.hash()).collect();
        let header = ChunkHeader {
            root: merkle_root(&hashes),
            headers: hashes,
        };
        let data = ChunkData {
            root: header.root,
            blocks: blocks.iter().map(|b| serialize(b).unwrap()).collect(),
        };
        (header, data)
    }

    fn header_set(chunks: Vec<ChunkHeader>) -> ChunkHeaders {
        let roots: Vec<[u8; 32]> = chunks.iter().map(|c| c.root).collect();
        ChunkHeaders {
            root: merkle_root(&roots),
            chunk_headers: chunks,
        }
    }

    #[test]
    fn test_verify_chunk_headers_accepts_valid_set() {
        let blocks = linked_blocks(2, 6);
        let (chunk_a, _) = chunk_for(&blocks[..3]);
        let (chunk_b, _) = chunk_for(&blocks[3..]);

        let set = header_set(vec![chunk_a, chunk_b]);
        assert!(MerkleVerifier.verify_chunk_headers(&set).is_ok());
    }

    #[test]
    fn test_verify_chunk_headers_accepts_empty_set() {
        let set = header_set(Vec::new());
        assert_eq!(set.root, [0u8; 32]);
        assert!(MerkleVerifier.verify_chunk_headers(&set).is_ok());
    }

    #[test]
    fn test_verify_chunk_headers_rejects_bad_chunk_root() {
        let blocks = linked_blocks(2, 3);
        let (mut chunk, _) = chunk_for(&blocks);
        chunk.root = [0xEE; 32];

        // Set root rebuilt over the forged chunk root, so only the inner
        // commitment is broken.
        let set = header_set(vec![chunk]);
        assert!(MerkleVerifier.verify_chunk_headers(&set).is_err());
    }

    #[test]
    fn test_verify_chunk_headers_rejects_bad_set_root() {
        let blocks = linked_blocks(2, 3);
        let (chunk, _) = chunk_for(&blocks);

        let mut set = header_set(vec![chunk]);
        set.root = [0xEE; 32];
        assert!(MerkleVerifier.verify_chunk_headers(&set).is_err());
    }

    #[test]
    fn test_verify_chunk_headers_rejects_empty_chunk() {
        let chunk = ChunkHeader {
            root: [0u8; 32],
            headers: Vec::new(),
        };
        let set = header_set(vec![chunk]);
        assert!(MerkleVerifier.verify_chunk_headers(&set).is_err());
    }

    #[test]
    fn test_verify_chunk_data_accepts_valid_payload() {
        let blocks = linked_blocks(2, 4);
        let (header, data) = chunk_for(&blocks);
        assert!(MerkleVerifier.verify_chunk_data(&header, &data).is_ok());
    }

    #[test]
    fn test_verify_chunk_data_rejects_root_mismatch() {
        let blocks = linked_blocks(2, 2);
        let (header, mut data) = chunk_for(&blocks);
        data.root = [0xEE; 32];
        assert!(MerkleVerifier.verify_chunk_data(&header, &data).is_err());
    }

    #[test]
    fn test_verify_chunk_data_rejects_missing_block() {
        let blocks = linked_blocks(2, 3);
        let (header, mut data) = chunk_for(&blocks);
        data.blocks.pop();
        assert!(MerkleVerifier.verify_chunk_data(&header, &data).is_err());
    }

    #[test]
    fn test_verify_chunk_data_rejects_substituted_block() {
        let blocks = linked_blocks(2, 3);
        let (header, mut data) = chunk_for(&blocks);

        let mut forged = blocks[1].clone();
        forged.header.timestamp += 999;
        data.blocks[1] = serialize(&forged).unwrap();

        assert!(MerkleVerifier.verify_chunk_data(&header, &data).is_err());
    }

    #[test]
    fn test_verify_chunk_data_rejects_broken_link() {
        let mut blocks = linked_blocks(2, 3);

        // Re-point the middle block away from its predecessor and recommit
        // its hash, so only the linkage check can catch it.
        blocks[1].header.prev_block_hash = [0xEE; 32];
        let (header, data) = chunk_for(&blocks);

        let err = MerkleVerifier.verify_chunk_data(&header, &data).unwrap_err();
        assert!(matches!(err, SyncError::Verification(ref msg) if msg.contains("link")));
    }

    #[test]
    fn test_verify_chunk_data_rejects_undecodable_block() {
        let blocks = linked_blocks(2, 2);
        let (header, mut data) = chunk_for(&blocks);
        data.blocks[0] = vec![0xFF; 3];

        assert!(matches!(
            MerkleVerifier.verify_chunk_data(&header, &data),
            Err(SyncError::Serialization(_))
        ));
    }
}

//! Chain state management.

use std::collections::HashMap;

use strata_core::Block;

use crate::error::{ChainError, ChainResult};
use crate::genesis::create_genesis_block;

/// In-memory canonical chain.
///
/// Blocks are indexed both by hash and by height. The chain only grows at
/// the tip; fork handling and reorganization are out of scope here, so every
/// stored block is canonical.
#[derive(Debug, Clone)]
pub struct ChainState {
    /// All blocks by hash.
    blocks: HashMap<[u8; 32], Block>,
    /// Canonical hashes ordered by height; `canonical[i]` is height `i + 1`.
    canonical: Vec<[u8; 32]>,
}

impl ChainState {
    /// Create a new chain containing only the genesis block.
    pub fn new() -> Self {
        let genesis = create_genesis_block();
        let genesis_hash = genesis.hash();

        let mut blocks = HashMap::new();
        blocks.insert(genesis_hash, genesis);

        Self {
            blocks,
            canonical: vec![genesis_hash],
        }
    }

    /// Get the tip of the canonical chain.
    pub fn tail_block(&self) -> &Block {
        let tip_hash = self
            .canonical
            .last()
            .expect("chain always contains genesis");
        &self.blocks[tip_hash]
    }

    /// Get the height of the canonical tip.
    pub fn height(&self) -> u64 {
        self.canonical.len() as u64
    }

    /// Get the hash of the genesis block.
    pub fn genesis_hash(&self) -> [u8; 32] {
        self.canonical[0]
    }

    /// Look up a block by hash.
    pub fn get_block(&self, hash: &[u8; 32]) -> Option<&Block> {
        self.blocks.get(hash)
    }

    /// Check whether a block is on the chain.
    pub fn has_block(&self, hash: &[u8; 32]) -> bool {
        self.blocks.contains_key(hash)
    }

    /// Look up the canonical block at a height.
    pub fn block_at_height(&self, height: u64) -> Option<&Block> {
        self.hash_at_height(height).map(|hash| &self.blocks[&hash])
    }

    /// Look up the canonical block hash at a height.
    pub fn hash_at_height(&self, height: u64) -> Option<[u8; 32]> {
        if height == 0 {
            return None;
        }
        self.canonical.get((height - 1) as usize).copied()
    }

    /// Get the number of stored blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Append a block to the tip of the canonical chain.
    ///
    /// The block must link to the current tip, carry the next height, and
    /// have a valid transaction root.
    pub fn append_block(&mut self, block: Block) -> ChainResult<()> {
        let tip_hash = *self.canonical.last().expect("chain always contains genesis");
        let expected_height = self.height() + 1;

        if block.header.prev_block_hash != tip_hash {
            return Err(ChainError::InvalidPrevHash {
                expected: tip_hash,
                actual: block.header.prev_block_hash,
            });
        }

        if block.height() != expected_height {
            return Err(ChainError::InvalidHeight {
                expected: expected_height,
                actual: block.height(),
            });
        }

        if !block.verify_tx_root() {
            return Err(ChainError::InvalidTxRoot {
                height: block.height(),
            });
        }

        let hash = block.hash();
        if self.blocks.contains_key(&hash) {
            return Err(ChainError::BlockAlreadyExists { hash });
        }

        tracing::debug!(height = block.height(), hash = ?&hash[..8], "Appended block");

        self.blocks.insert(hash, block);
        self.canonical.push(hash);
        Ok(())
    }

    /// Append a contiguous run of blocks to the tip.
    ///
    /// Blocks are applied in order; application stops at the first invalid
    /// block and the error is returned. Blocks applied before the failure
    /// remain on the chain.
    pub fn append_chunk(&mut self, blocks: Vec<Block>) -> ChainResult<()> {
        if blocks.is_empty() {
            return Err(ChainError::EmptyChunk);
        }

        let count = blocks.len();
        for block in blocks {
            self.append_block(block)?;
        }

        tracing::debug!(count, height = self.height(), "Applied chunk");
        Ok(())
    }
}

impl Default for ChainState {
    fn default() -> Self {
        Self::new()
    }
}

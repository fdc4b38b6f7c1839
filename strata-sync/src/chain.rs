//! Chain capability surface.
//!
//! The sync task reads the chain and applies chunks through narrow traits so
//! that it never holds more of the node than it needs; the node wires in the
//! real chain at construction.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use strata_chain::ChainState;
use strata_core::Block;

use crate::error::SyncResult;
use crate::messages::ChunkData;

/// Read access to the canonical chain.
pub trait ChainReader: Send + Sync {
    /// Get the current tip of the canonical chain.
    fn tail_block(&self) -> Block;

    /// Look up the canonical block at a height.
    fn block_by_height(&self, height: u64) -> Option<Block>;
}

/// Applies a validated chunk's blocks to the tip of the chain.
pub trait ChunkProcessor: Send + Sync {
    /// Apply the chunk; on success the chain tail advances by the chunk's
    /// block count.
    fn process_chunk(&self, data: &ChunkData) -> SyncResult<()>;
}

/// A canonical chain shared between the sync task and the rest of the node.
#[derive(Clone)]
pub struct SharedChain {
    inner: Arc<RwLock<ChainState>>,
}

impl SharedChain {
    /// Wrap a chain state for shared access.
    pub fn new(chain: ChainState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(chain)),
        }
    }

    /// Acquire read access to the chain.
    pub fn read(&self) -> RwLockReadGuard<'_, ChainState> {
        self.inner.read()
    }

    /// Acquire write access to the chain.
    pub fn write(&self) -> RwLockWriteGuard<'_, ChainState> {
        self.inner.write()
    }
}

impl ChainReader for SharedChain {
    fn tail_block(&self) -> Block {
        self.read().tail_block().clone()
    }

    fn block_by_height(&self, height: u64) -> Option<Block> {
        self.read().block_at_height(height).cloned()
    }
}

//! Genesis block creation.

use strata_core::{Block, BlockHeader};

/// Height of the genesis block. The canonical chain starts at height 1.
pub const GENESIS_HEIGHT: u64 = 1;

/// Fixed timestamp of the genesis block (2023-11-14T22:13:20Z).
pub const GENESIS_TIMESTAMP: u64 = 1700000000;

/// Create the genesis block.
///
/// The genesis block has height 1, a zero previous-block hash, and no
/// transactions. Every node derives the same genesis, so its hash doubles
/// as the network identity.
pub fn create_genesis_block() -> Block {
    Block {
        header: BlockHeader {
            version: BlockHeader::VERSION,
            height: GENESIS_HEIGHT,
            timestamp: GENESIS_TIMESTAMP,
            prev_block_hash: [0u8; 32],
            tx_root: [0u8; 32],
        },
        transactions: Vec::new(),
    }
}

//! Block structure and header.

use serde::{Deserialize, Serialize};

use crate::hashing::{merkle_root, sha256};
use crate::serialization::serialize;

/// Block header containing metadata and commitments.
///
/// The block hash is computed from the serialized header,
/// not including the transaction bodies (which are committed via tx_root).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Protocol version (currently 1).
    pub version: u32,

    /// Block height. The first block on the canonical chain has height 1.
    pub height: u64,

    /// Unix timestamp in seconds.
    pub timestamp: u64,

    /// SHA-256 hash of the previous block header.
    /// All zeros for the genesis block.
    pub prev_block_hash: [u8; 32],

    /// Merkle root of transaction IDs in this block.
    pub tx_root: [u8; 32],
}

impl BlockHeader {
    /// Protocol version number.
    pub const VERSION: u32 = 1;

    /// Compute the block hash.
    ///
    /// The hash is SHA-256 of the bincode-serialized header.
    pub fn hash(&self) -> [u8; 32] {
        let bytes = serialize(self).expect("BlockHeader serialization should not fail");
        sha256(&bytes)
    }

    /// Check if this is a genesis block.
    #[inline]
    pub fn is_genesis(&self) -> bool {
        self.height == 1 && self.prev_block_hash == [0u8; 32]
    }
}

/// A block containing a header and ordered transactions.
///
/// Transaction bodies are opaque byte blobs; the chain only commits to them
/// through the header's `tx_root`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block header with metadata and commitments.
    pub header: BlockHeader,

    /// Ordered list of serialized transactions in this block.
    pub transactions: Vec<Vec<u8>>,
}

impl Block {
    /// Compute the Merkle root of transaction IDs.
    ///
    /// Transaction IDs are SHA-256 hashes of the serialized transactions.
    pub fn compute_tx_root(&self) -> [u8; 32] {
        let tx_ids: Vec<[u8; 32]> = self.transactions.iter().map(|tx| sha256(tx)).collect();
        merkle_root(&tx_ids)
    }

    /// Verify that the header's tx_root matches the transactions.
    pub fn verify_tx_root(&self) -> bool {
        self.header.tx_root == self.compute_tx_root()
    }

    /// Get the block hash (delegates to header).
    #[inline]
    pub fn hash(&self) -> [u8; 32] {
        self.header.hash()
    }

    /// Get the block height.
    #[inline]
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Check if this is a genesis block.
    #[inline]
    pub fn is_genesis(&self) -> bool {
        self.header.is_genesis()
    }

    /// Get the number of transactions.
    #[inline]
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::deserialize;

    fn test_block(transactions: Vec<Vec<u8>>) -> Block {
        let tx_ids: Vec<[u8; 32]> = transactions.iter().map(|tx| sha256(tx)).collect();

        Block {
            header: BlockHeader {
                version: BlockHeader::VERSION,
                height: 2,
                timestamp: 1700000000,
                prev_block_hash: [0xAB; 32],
                tx_root: merkle_root(&tx_ids),
            },
            transactions,
        }
    }

    #[test]
    fn test_block_hash_determinism() {
        let block = test_block(vec![]);
        assert_eq!(block.hash(), block.hash());
        assert_eq!(block.hash(), block.header.hash());
    }

    #[test]
    fn test_block_hash_changes_with_any_field() {
        let baseline = test_block(vec![]);
        let baseline_hash = baseline.hash();

        let mut h = baseline.clone();
        h.header.height = 3;
        assert_ne!(h.hash(), baseline_hash);

        let mut h = baseline.clone();
        h.header.timestamp = 1700000001;
        assert_ne!(h.hash(), baseline_hash);

        let mut h = baseline.clone();
        h.header.prev_block_hash = [1u8; 32];
        assert_ne!(h.hash(), baseline_hash);

        let mut h = baseline;
        h.header.tx_root = [3u8; 32];
        assert_ne!(h.hash(), baseline_hash);
    }

    #[test]
    fn test_empty_block_tx_root() {
        let block = test_block(vec![]);
        assert_eq!(block.tx_count(), 0);
        assert_eq!(block.compute_tx_root(), [0u8; 32]);
        assert!(block.verify_tx_root());
    }

    #[test]
    fn test_single_transaction_tx_root() {
        let tx = b"payment:alice->bob:10".to_vec();
        let block = test_block(vec![tx.clone()]);

        assert_eq!(block.tx_count(), 1);
        assert!(block.verify_tx_root());

        // Merkle root of a single tx is just the tx ID
        assert_eq!(block.compute_tx_root(), sha256(&tx));
    }

    #[test]
    fn test_verify_tx_root_fails_with_wrong_root() {
        let mut block = test_block(vec![b"tx".to_vec()]);
        block.header.tx_root = [0xFF; 32];
        assert!(!block.verify_tx_root());
    }

    #[test]
    fn test_is_genesis() {
        let mut block = test_block(vec![]);
        assert!(!block.is_genesis());

        block.header.height = 1;
        block.header.prev_block_hash = [0u8; 32];
        assert!(block.is_genesis());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let block = test_block(vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);

        let bytes = serialize(&block).unwrap();
        let recovered: Block = deserialize(&bytes).unwrap();

        assert_eq!(block, recovered);
        assert_eq!(block.hash(), recovered.hash());
    }
}

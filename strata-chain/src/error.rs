//! Chain error types.

use std::fmt;

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors that can occur during chain operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainError {
    /// Block height does not match expected height.
    InvalidHeight {
        /// Height the chain expected next.
        expected: u64,
        /// Height the block carried.
        actual: u64,
    },

    /// Previous block hash does not match the current tip.
    InvalidPrevHash {
        /// Hash of the current tip.
        expected: [u8; 32],
        /// Hash the block referenced.
        actual: [u8; 32],
    },

    /// Transaction root does not match computed Merkle root.
    InvalidTxRoot {
        /// Height of the offending block.
        height: u64,
    },

    /// Block with this hash already exists in the chain.
    BlockAlreadyExists {
        /// Hash of the duplicate block.
        hash: [u8; 32],
    },

    /// Attempted to apply a chunk with no blocks.
    EmptyChunk,
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::InvalidHeight { expected, actual } => {
                write!(f, "invalid height: expected {}, got {}", expected, actual)
            }
            ChainError::InvalidPrevHash { expected, actual } => write!(
                f,
                "invalid prev hash: expected {:02x?}, got {:02x?}",
                &expected[..8],
                &actual[..8]
            ),
            ChainError::InvalidTxRoot { height } => {
                write!(f, "invalid tx root in block at height {}", height)
            }
            ChainError::BlockAlreadyExists { hash } => {
                write!(f, "block already exists: {:02x?}", &hash[..8])
            }
            ChainError::EmptyChunk => write!(f, "chunk contains no blocks"),
        }
    }
}

impl std::error::Error for ChainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = ChainError::InvalidHeight {
            expected: 5,
            actual: 7,
        };
        assert!(e.to_string().contains("expected 5"));

        assert!(ChainError::EmptyChunk.to_string().contains("no blocks"));
    }
}

//! Sync error types.

use thiserror::Error;

use strata_core::SerializationError;

/// Sync-specific errors.
///
/// Every peer-attributable error closes the offending peer and is recovered
/// locally; none of these terminate the sync task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A chunk-headers payload could not be decoded.
    #[error("invalid chunk headers message data")]
    InvalidChunkHeadersMessage,

    /// A chunk-headers payload decoded but failed content verification.
    #[error("wrong chunk headers message data")]
    WrongChunkHeadersMessage,

    /// A chunk-data payload could not be decoded.
    #[error("invalid chunk data message data")]
    InvalidChunkDataMessage,

    /// Chunk data arrived for a root we did not request.
    #[error("wrong chunk data message data")]
    WrongChunkDataMessage,

    /// A chunk-headers reply arrived from a peer we did not solicit.
    #[error("invalid chunk headers source peer")]
    InvalidSourcePeer,

    /// A chunk failed verification against its header.
    #[error("chunk verification failed: {0}")]
    Verification(String),

    /// The chunk-apply collaborator rejected a chunk.
    #[error("chunk apply failed: {0}")]
    ChunkApply(String),

    /// A block referenced by a chunk header is not known locally.
    #[error("unknown block: {0}")]
    UnknownBlock(String),

    /// Encoding or decoding a protocol structure failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

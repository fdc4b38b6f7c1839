//! Chunked chain synchronization for the Strata protocol.
//!
//! When a node falls behind or joins the network, the sync task drives it
//! toward the canonical chain:
//!
//! 1. Ask a curated set of peers to enumerate forward chunks from our tail
//! 2. Tally the replies by root hash until enough peers agree
//! 3. Fetch the winning chunks from random peers, several at a time
//! 4. Apply fetched chunks to the chain in strict height order
//! 5. Advance the tail and repeat until peers answer with an empty set
//!
//! # Architecture
//!
//! The task owns one long-lived driver task; inbound messages are routed to
//! it by the owning node and synchronize through a single lock.
//!
//! ```text
//! Node demux ──► process_chunk_headers ──┐
//!            ──► process_chunk_data ─────┤  one lock over
//!                                        │  voting + fetch state
//! Driver task (SyncTask::start) ─────────┘
//!   └── select { quit, ticker, phase-done }
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use strata_sync::{ChunkService, MerkleVerifier, SharedChain, SyncConfig, SyncTask};
//!
//! let chain = SharedChain::new(strata_chain::ChainState::new());
//! let service = Arc::new(ChunkService::new(chain.clone(), &SyncConfig::default()));
//!
//! let mut task = SyncTask::new(
//!     Arc::new(chain),
//!     net,                        // the node's NetService impl
//!     Arc::new(MerkleVerifier),
//!     service,
//!     SyncConfig::default(),
//! );
//! let done = task.completion_receiver();
//! task.start();
//! // route inbound ChainChunkHeaders / ChainChunkData payloads into the task
//! done.await?;
//! ```

#![deny(unsafe_code)]

pub mod chain;
pub mod chunk;
pub mod config;
pub mod error;
pub mod messages;
pub mod net;
pub mod task;
pub mod verify;

// Re-export main types
pub use chain::{ChainReader, ChunkProcessor, SharedChain};
pub use chunk::ChunkService;
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use messages::{ChunkData, ChunkHeader, ChunkHeaders, SyncRequest, Topic};
pub use net::{MessagePriority, NetService, PeerFilter, PeerId};
pub use task::SyncTask;
pub use verify::{ChunkVerifier, MerkleVerifier};

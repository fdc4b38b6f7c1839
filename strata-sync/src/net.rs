//! Transport capability surface.
//!
//! The sync task never owns sockets; it talks to the network through the
//! [`NetService`] trait, which the owning node implements on top of its peer
//! manager. Both operations must be cheap and non-blocking: they are invoked
//! while the task lock is held.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SyncError;
use crate::messages::Topic;

/// Unique identifier for a peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub u64);

impl PeerId {
    /// Create a new peer ID from a counter value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Delivery priority of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePriority {
    /// Consensus-critical traffic.
    High,
    /// Ordinary traffic.
    Normal,
    /// Bulk traffic that may be delayed under load; all sync messages
    /// travel at this priority.
    Low,
}

/// Which peers an outbound message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerFilter {
    /// The curated subset of peers suitable for chain synchronization.
    ChainSyncPeers,
    /// A single peer picked at random.
    RandomPeer,
}

/// Transport operations consumed by the sync task.
pub trait NetService: Send + Sync {
    /// Send a message to the peers selected by `filter`.
    ///
    /// Returns the peers actually contacted; for [`PeerFilter::ChainSyncPeers`]
    /// this set becomes the list of solicited peers whose replies are accepted.
    fn send_to_peers(
        &self,
        topic: Topic,
        data: Vec<u8>,
        priority: MessagePriority,
        filter: PeerFilter,
    ) -> Vec<PeerId>;

    /// Disconnect a peer, recording why. Fire-and-forget.
    fn close_peer(&self, peer: PeerId, reason: SyncError);
}

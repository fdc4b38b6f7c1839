//! Chunk header voting.
//!
//! Tracks `ChunkHeaders` replies from the peers solicited in the current
//! round, tallies them by root hash, and decides when enough peers agree to
//! start fetching.

use std::collections::{HashMap, HashSet};

use crate::messages::ChunkHeaders;
use crate::net::PeerId;

/// Vote tally over chunk header sets, keyed by hex-encoded root.
#[derive(Debug, Default)]
pub(crate) struct HeaderVoting {
    /// Peers solicited in the current round; replies from anyone else are
    /// rejected.
    peers: Vec<PeerId>,
    /// Representative header set per root.
    all_headers: HashMap<String, ChunkHeaders>,
    /// Number of distinct peers voting for each root.
    votes: HashMap<String, usize>,
    /// (root, peer) pairs already credited, so a peer cannot vote twice.
    credited: HashSet<(String, PeerId)>,
    /// Vote count of the current front-runner.
    max_votes: usize,
    /// Header set of the current front-runner.
    winning: Option<ChunkHeaders>,
}

impl HeaderVoting {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Clear all round state.
    pub(crate) fn reset(&mut self) {
        self.peers.clear();
        self.all_headers.clear();
        self.votes.clear();
        self.credited.clear();
        self.max_votes = 0;
        self.winning = None;
    }

    /// Record which peers were solicited this round.
    pub(crate) fn set_peers(&mut self, peers: Vec<PeerId>) {
        self.peers = peers;
    }

    pub(crate) fn has_peers(&self) -> bool {
        !self.peers.is_empty()
    }

    pub(crate) fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Check whether a reply comes from a peer we solicited.
    pub(crate) fn is_solicited(&self, peer: PeerId) -> bool {
        self.peers.contains(&peer)
    }

    /// Check whether this peer already voted for this root.
    pub(crate) fn is_duplicate(&self, root_hex: &str, peer: PeerId) -> bool {
        self.credited.contains(&(root_hex.to_string(), peer))
    }

    /// Credit a vote. Returns the root's new count and whether it is now the
    /// front-runner.
    pub(crate) fn record(
        &mut self,
        root_hex: String,
        peer: PeerId,
        headers: ChunkHeaders,
    ) -> (usize, bool) {
        let count = self.votes.get(&root_hex).copied().unwrap_or(0) + 1;
        self.votes.insert(root_hex.clone(), count);
        self.credited.insert((root_hex.clone(), peer));

        let is_max = count > self.max_votes;
        if is_max {
            self.max_votes = count;
            self.winning = Some(headers.clone());
        }

        self.all_headers.insert(root_hex, headers);
        (count, is_max)
    }

    /// Whether enough solicited peers agree on one root.
    ///
    /// The threshold is the square root of the solicited peer count,
    /// truncated: sub-linear in peer count, tolerant of a constant number of
    /// silent or lying peers. A single-peer round is satisfied by one reply.
    pub(crate) fn has_quorum(&self) -> bool {
        let peer_count = self.peers.len();
        peer_count > 0 && self.max_votes >= (peer_count as f64).sqrt() as usize
    }

    pub(crate) fn max_votes(&self) -> usize {
        self.max_votes
    }

    /// The header set currently holding the most votes.
    pub(crate) fn winning(&self) -> Option<&ChunkHeaders> {
        self.winning.as_ref()
    }
}

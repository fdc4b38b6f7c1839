//! Shared helpers for sync acceptance tests.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{sleep, timeout};

use strata_chain::ChainState;
use strata_core::{Block, BlockHeader};
use strata_sync::{
    MessagePriority, NetService, PeerFilter, PeerId, SharedChain, SyncError, Topic,
};

/// A message the task handed to the transport.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub topic: Topic,
    pub data: Vec<u8>,
    pub filter: PeerFilter,
}

/// Recording transport with a fixed solicited peer set.
pub struct MockNet {
    peers: Vec<PeerId>,
    sent: Mutex<Vec<SentMessage>>,
    closed: Mutex<Vec<(PeerId, SyncError)>>,
}

impl MockNet {
    pub fn new(peer_count: u64) -> Arc<Self> {
        Arc::new(Self {
            peers: (1..=peer_count).map(PeerId::new).collect(),
            sent: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
        })
    }

    /// All recorded payloads for one topic, in send order.
    pub fn payloads_of(&self, topic: Topic) -> Vec<Vec<u8>> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.topic == topic)
            .map(|m| m.data.clone())
            .collect()
    }

    /// Number of messages sent on one topic.
    pub fn count_of(&self, topic: Topic) -> usize {
        self.sent.lock().iter().filter(|m| m.topic == topic).count()
    }

    /// Peer filters used for one topic, in send order.
    pub fn filters_of(&self, topic: Topic) -> Vec<PeerFilter> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.topic == topic)
            .map(|m| m.filter)
            .collect()
    }

    /// Peers closed so far, with reasons.
    pub fn closed_peers(&self) -> Vec<(PeerId, SyncError)> {
        self.closed.lock().clone()
    }
}

impl NetService for MockNet {
    fn send_to_peers(
        &self,
        topic: Topic,
        data: Vec<u8>,
        _priority: MessagePriority,
        filter: PeerFilter,
    ) -> Vec<PeerId> {
        self.sent.lock().push(SentMessage { topic, data, filter });
        match filter {
            PeerFilter::ChainSyncPeers => self.peers.clone(),
            PeerFilter::RandomPeer => self.peers.first().copied().into_iter().collect(),
        }
    }

    fn close_peer(&self, peer: PeerId, reason: SyncError) {
        self.closed.lock().push((peer, reason));
    }
}

/// Build the next empty block on top of a chain, with a timestamp offset so
/// different offsets produce different (still valid) chains.
pub fn next_block(chain: &ChainState, step: u64) -> Block {
    let tip = chain.tail_block();
    Block {
        header: BlockHeader {
            version: BlockHeader::VERSION,
            height: tip.height() + 1,
            timestamp: tip.header.timestamp + step,
            prev_block_hash: tip.hash(),
            tx_root: [0u8; 32],
        },
        transactions: Vec::new(),
    }
}

/// A chain extended by `count` empty blocks past genesis.
pub fn chain_with_blocks(count: u64, step: u64) -> SharedChain {
    let mut chain = ChainState::new();
    for _ in 0..count {
        let block = next_block(&chain, step);
        chain.append_block(block).unwrap();
    }
    SharedChain::new(chain)
}

/// Poll a condition until it holds or five seconds pass.
pub async fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    timeout(Duration::from_secs(5), async {
        while !cond() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok()
}

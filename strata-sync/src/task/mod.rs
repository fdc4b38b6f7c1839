//! The chain synchronization task.
//!
//! A two-phase state machine, restarted until the network reports we are at
//! the tip:
//!
//! 1. **Header agreement** — send a sync request to the chain-sync peer set
//!    and tally `ChunkHeaders` replies until enough peers agree on one root.
//!    A ticker re-sends the request when agreement stalls, rewinding the sync
//!    point one chunk after repeated failures (a tail off the majority chain
//!    never converges; a shared prefix does).
//! 2. **Data fetch** — request the winning chunks from random peers, several
//!    in flight at once, re-sending on timeout, buffering out-of-order
//!    arrivals, and applying payloads in strict index order.
//!
//! An empty winning set means the network has nothing beyond our tail: the
//! task reports completion and exits. Peers that send unsolicited, malformed,
//! or unverifiable data are closed; silence is handled by re-sending, never
//! by closing.

mod fetcher;
mod voting;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use strata_core::serialization::{deserialize, serialize};
use strata_core::Block;

use crate::chain::{ChainReader, ChunkProcessor};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::messages::{ChunkData, ChunkHeaders, SyncRequest, Topic};
use crate::net::{MessagePriority, NetService, PeerFilter, PeerId};
use crate::verify::ChunkVerifier;

use fetcher::{ChunkStatus, ChunkWindow};
use voting::HeaderVoting;

/// Current Unix time in seconds.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Mutable task state, guarded by one lock.
struct TaskState {
    /// Block the next header request extends from. Starts at the chain tail,
    /// advances to the new tail after a fetched round, rewinds one chunk on
    /// repeated agreement failure.
    sync_point: Block,
    /// Number of header requests sent so far.
    retry_count: u32,
    /// Header agreement state.
    voting: HeaderVoting,
    /// Chunk download state.
    window: ChunkWindow,
}

impl TaskState {
    /// Clear all round state. The retry count and sync point survive.
    fn reset(&mut self) {
        self.voting.reset();
        self.window.reset();
    }
}

/// Everything shared between the driver task and the message handlers.
struct TaskShared {
    config: SyncConfig,
    chain: Arc<dyn ChainReader>,
    net: Arc<dyn NetService>,
    verifier: Arc<dyn ChunkVerifier>,
    processor: Arc<dyn ChunkProcessor>,
    state: Mutex<TaskState>,
    voting_done_tx: mpsc::Sender<()>,
    fetch_done_tx: mpsc::Sender<()>,
}

/// The chain synchronization task.
///
/// Create it with its collaborators, call [`start`](SyncTask::start) once,
/// and route inbound `ChainChunkHeaders` / `ChainChunkData` payloads into the
/// two `process_*` handlers. [`stop`](SyncTask::stop) is idempotent; the task
/// is not reusable after stopping.
pub struct SyncTask {
    shared: Arc<TaskShared>,
    quit_tx: mpsc::Sender<()>,
    quit_rx: Option<mpsc::Receiver<()>>,
    voting_done_rx: Option<mpsc::Receiver<()>>,
    fetch_done_rx: Option<mpsc::Receiver<()>>,
    completion_tx: Option<oneshot::Sender<()>>,
    driver: Option<JoinHandle<()>>,
}

impl SyncTask {
    /// Create a sync task over the given collaborators.
    ///
    /// The initial sync point is the chain's current tail.
    pub fn new(
        chain: Arc<dyn ChainReader>,
        net: Arc<dyn NetService>,
        verifier: Arc<dyn ChunkVerifier>,
        processor: Arc<dyn ChunkProcessor>,
        config: SyncConfig,
    ) -> Self {
        let (quit_tx, quit_rx) = mpsc::channel(1);
        let (voting_done_tx, voting_done_rx) = mpsc::channel(1);
        let (fetch_done_tx, fetch_done_rx) = mpsc::channel(1);

        let sync_point = chain.tail_block();

        let shared = Arc::new(TaskShared {
            config,
            chain,
            net,
            verifier,
            processor,
            state: Mutex::new(TaskState {
                sync_point,
                retry_count: 0,
                voting: HeaderVoting::new(),
                window: ChunkWindow::new(),
            }),
            voting_done_tx,
            fetch_done_tx,
        });

        Self {
            shared,
            quit_tx,
            quit_rx: Some(quit_rx),
            voting_done_rx: Some(voting_done_rx),
            fetch_done_rx: Some(fetch_done_rx),
            completion_tx: None,
            driver: None,
        }
    }

    /// Get a receiver that resolves exactly once when synchronization
    /// completes cleanly. Stopping the task drops the sender instead.
    pub fn completion_receiver(&mut self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.completion_tx = Some(tx);
        rx
    }

    /// Spawn the driver task. Has no effect if called more than once.
    pub fn start(&mut self) {
        let (Some(quit_rx), Some(voting_done_rx), Some(fetch_done_rx)) = (
            self.quit_rx.take(),
            self.voting_done_rx.take(),
            self.fetch_done_rx.take(),
        ) else {
            tracing::warn!("Sync task already started");
            return;
        };

        let shared = self.shared.clone();
        let completion_tx = self.completion_tx.take();

        self.driver = Some(tokio::spawn(run_sync_loop(
            shared,
            quit_rx,
            voting_done_rx,
            fetch_done_rx,
            completion_tx,
        )));
    }

    /// Ask the driver to exit at its next iteration. Idempotent.
    pub fn stop(&self) {
        let _ = self.quit_tx.try_send(());
    }

    /// Wait for the driver task to exit. Meaningful after [`stop`](Self::stop)
    /// or once completion has been reported.
    pub async fn join(&mut self) {
        if let Some(driver) = self.driver.take() {
            let _ = driver.await;
        }
    }

    /// Handle an inbound `ChainChunkHeaders` payload.
    pub fn process_chunk_headers(&self, from: PeerId, payload: &[u8]) {
        self.shared.process_chunk_headers(from, payload);
    }

    /// Handle an inbound `ChainChunkData` payload.
    pub fn process_chunk_data(&self, from: PeerId, payload: &[u8]) {
        self.shared.process_chunk_data(from, payload);
    }
}

/// The driver loop: alternate header agreement and data fetch until synced
/// or stopped.
async fn run_sync_loop(
    shared: Arc<TaskShared>,
    mut quit_rx: mpsc::Receiver<()>,
    mut voting_done_rx: mpsc::Receiver<()>,
    mut fetch_done_rx: mpsc::Receiver<()>,
    mut completion_tx: Option<oneshot::Sender<()>>,
) {
    loop {
        shared.send_chain_sync();

        let mut header_ticker = interval_at(
            Instant::now() + shared.config.header_interval,
            shared.config.header_interval,
        );

        // Header agreement phase.
        loop {
            tokio::select! {
                _ = quit_rx.recv() => {
                    tracing::debug!("Stopping sync loop");
                    return;
                }
                _ = header_ticker.tick() => {
                    shared.retry_header_phase();
                }
                _ = voting_done_rx.recv() => {
                    tracing::debug!("Chunk header agreement reached, fetching data");
                    break;
                }
            }
        }

        shared.seed_chunk_requests();

        let mut data_ticker = interval_at(
            Instant::now() + shared.config.data_interval,
            shared.config.data_interval,
        );

        // Data fetch phase.
        loop {
            tokio::select! {
                _ = quit_rx.recv() => {
                    tracing::debug!("Stopping sync loop");
                    return;
                }
                _ = data_ticker.tick() => {
                    shared.resend_timed_out();
                }
                _ = fetch_done_rx.recv() => {
                    if shared.finish_round() {
                        if let Some(tx) = completion_tx.take() {
                            let _ = tx.send(());
                        }
                        return;
                    }
                    break;
                }
            }
        }
    }
}

impl TaskShared {
    /// Send the sync request for the current sync point and record which
    /// peers were solicited.
    fn send_chain_sync(&self) {
        let mut st = self.state.lock();

        tracing::info!(
            height = st.sync_point.height(),
            hash = ?&st.sync_point.hash()[..8],
            attempt = st.retry_count,
            "Requesting chunk headers"
        );
        st.retry_count += 1;

        let request = SyncRequest {
            tail_block_hash: st.sync_point.hash(),
        };
        let data = match serialize(&request) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode sync request");
                return;
            }
        };

        let peers = self.net.send_to_peers(
            Topic::ChainSync,
            data,
            MessagePriority::Low,
            PeerFilter::ChainSyncPeers,
        );
        st.voting.set_peers(peers);
    }

    /// Header ticker fired: if agreement is still missing, start the round
    /// over, possibly from an earlier sync point.
    fn retry_header_phase(&self) {
        {
            let mut st = self.state.lock();
            if st.voting.has_quorum() {
                return;
            }
            st.reset();
            self.rewind_sync_point(&mut st);
        }
        self.send_chain_sync();
    }

    /// Move the sync point back one chunk once retries indicate our tail is
    /// not on the majority chain. The first retry keeps the point, giving
    /// stragglers another chance.
    fn rewind_sync_point(&self, st: &mut TaskState) {
        if st.retry_count < 2 {
            return;
        }

        let height = st.sync_point.height();
        let target = height.saturating_sub(self.config.chunk_size).max(1);

        match self.chain.block_by_height(target) {
            Some(block) => {
                tracing::info!(from = height, to = target, "Rewinding sync point");
                st.sync_point = block;
            }
            None => {
                tracing::warn!(height = target, "No canonical block to rewind to");
            }
        }
    }

    /// Handle a `ChunkHeaders` reply from a solicited peer.
    fn process_chunk_headers(&self, from: PeerId, payload: &[u8]) {
        let mut st = self.state.lock();

        if st.voting.has_quorum() {
            return;
        }

        if !st.voting.has_peers() || !st.voting.is_solicited(from) {
            tracing::debug!(peer = %from, "Chunk headers from unsolicited peer");
            self.net.close_peer(from, SyncError::InvalidSourcePeer);
            return;
        }

        let headers: ChunkHeaders = match deserialize(payload) {
            Ok(headers) => headers,
            Err(e) => {
                tracing::debug!(peer = %from, error = %e, "Undecodable chunk headers message");
                self.net
                    .close_peer(from, SyncError::InvalidChunkHeadersMessage);
                return;
            }
        };

        if let Err(e) = self.verifier.verify_chunk_headers(&headers) {
            tracing::debug!(peer = %from, error = %e, "Chunk headers failed verification");
            self.net.close_peer(from, SyncError::WrongChunkHeadersMessage);
            return;
        }

        let root_hex = headers.root_hex();
        if st.voting.is_duplicate(&root_hex, from) {
            tracing::debug!(peer = %from, root = %root_hex, "Duplicate chunk headers vote");
            return;
        }

        let (count, is_max) = st.voting.record(root_hex.clone(), from, headers);
        tracing::debug!(peer = %from, root = %root_hex, count, is_max, "Recorded chunk headers vote");

        if st.voting.has_quorum() {
            tracing::debug!(
                votes = st.voting.max_votes(),
                peers = st.voting.peer_count(),
                "Enough peers agree on chunk headers"
            );
            let _ = self.voting_done_tx.try_send(());
        }
    }

    /// Put the initial batch of chunk requests in flight.
    fn seed_chunk_requests(&self) {
        let mut st = self.state.lock();

        let total = st.voting.winning().map_or(0, |w| w.chunk_headers.len());
        if total == 0 {
            tracing::debug!("Winning chunk header set is empty, nothing to fetch");
            let _ = self.fetch_done_tx.try_send(());
            return;
        }

        let mut sent = 0;
        for index in 0..total {
            if sent >= self.config.concurrent_requests {
                break;
            }
            if st.window.status(index) == ChunkStatus::NotStarted
                && self.send_chunk_request(&mut st, index)
            {
                st.window.set_sync_pos(index);
                sent += 1;
            }
        }
    }

    /// Request the payload for one chunk index from a random peer.
    ///
    /// Returns whether a request actually went out; an encoding failure
    /// leaves the index's status untouched.
    fn send_chunk_request(&self, st: &mut TaskState, index: usize) -> bool {
        let Some(header) = st
            .voting
            .winning()
            .and_then(|w| w.chunk_headers.get(index))
        else {
            return false;
        };

        let data = match serialize(header) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, index, "Failed to encode chunk request");
                return false;
            }
        };

        self.net.send_to_peers(
            Topic::ChainGetChunk,
            data,
            MessagePriority::Low,
            PeerFilter::RandomPeer,
        );
        st.window.mark_in_flight(index, unix_now());
        true
    }

    /// Data ticker fired: re-request every in-flight chunk whose request has
    /// gone unanswered past the timeout.
    fn resend_timed_out(&self) {
        let mut st = self.state.lock();

        let deadline = unix_now().saturating_sub(self.config.chunk_data_timeout.as_secs());
        for index in st.window.timed_out(deadline) {
            tracing::debug!(index, "Chunk request timed out, re-sending");
            self.send_chunk_request(&mut st, index);
        }
    }

    /// Handle a `ChunkData` reply: verify it, buffer it, apply everything
    /// that is now contiguous, and slide the request window forward.
    fn process_chunk_data(&self, from: PeerId, payload: &[u8]) {
        let data: ChunkData = match deserialize(payload) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(peer = %from, error = %e, "Undecodable chunk data message");
                self.net.close_peer(from, SyncError::InvalidChunkDataMessage);
                return;
            }
        };

        let mut st = self.state.lock();

        let Some(winning) = st.voting.winning() else {
            tracing::debug!(peer = %from, "Chunk data outside a fetch round");
            self.net.close_peer(from, SyncError::WrongChunkDataMessage);
            return;
        };

        let Some(index) = winning
            .chunk_headers
            .iter()
            .position(|h| h.root == data.root)
        else {
            tracing::debug!(peer = %from, "Chunk data for a root we did not request");
            self.net.close_peer(from, SyncError::WrongChunkDataMessage);
            return;
        };

        if st.window.is_finished(index) {
            tracing::debug!(peer = %from, index, "Duplicate chunk data");
            return;
        }

        if let Err(e) = self
            .verifier
            .verify_chunk_data(&winning.chunk_headers[index], &data)
        {
            tracing::debug!(peer = %from, index, error = %e, "Chunk data failed verification, re-requesting");
            self.net.close_peer(from, e);
            self.send_chunk_request(&mut st, index);
            return;
        }

        st.window.insert(index, data);

        // Apply every buffered chunk that is now next in line.
        loop {
            let outcome = match st.window.next_ready() {
                Some(chunk) => self.processor.process_chunk(chunk),
                None => break,
            };
            match outcome {
                Ok(()) => st.window.advance(),
                Err(e) => {
                    tracing::debug!(peer = %from, index, error = %e, "Chunk apply failed, re-requesting");
                    self.net.close_peer(from, e);
                    self.send_chunk_request(&mut st, index);
                    return;
                }
            }
        }

        st.window.mark_finished(index);
        tracing::debug!(index, applied = st.window.process_pos(), "Chunk accepted");

        self.request_next(&mut st);
    }

    /// Slide the request window one chunk forward, or signal the phase done
    /// once every chunk has finished.
    fn request_next(&self, st: &mut TaskState) {
        let total = st.voting.winning().map_or(0, |w| w.chunk_headers.len());

        let next = st.window.sync_pos() + 1;
        if next >= total {
            if st.window.all_finished(total) {
                tracing::debug!(total, "All chunks fetched");
                let _ = self.fetch_done_tx.try_send(());
            }
            return;
        }

        if self.send_chunk_request(st, next) {
            st.window.set_sync_pos(next);
        }
    }

    /// Fetch phase ended. Returns true when the round proved we are at the
    /// tip; otherwise rolls state over for the next round.
    fn finish_round(&self) -> bool {
        let mut st = self.state.lock();

        let synced = st
            .voting
            .winning()
            .map_or(true, |w| w.chunk_headers.is_empty());
        if synced {
            tracing::info!("Chain synchronization complete");
            return true;
        }

        st.reset();
        st.sync_point = self.chain.tail_block();
        false
    }
}

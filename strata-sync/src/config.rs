//! Sync configuration.

use std::time::Duration;

/// Default number of blocks per chunk, shared with the chain.
pub const DEFAULT_CHUNK_SIZE: u64 = 32;

/// Default number of chunk requests kept in flight at seed time.
pub const DEFAULT_CONCURRENT_REQUESTS: usize = 10;

/// Default time to wait for a chunk payload before re-requesting it.
pub const DEFAULT_CHUNK_DATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Default interval between header-phase retries.
pub const DEFAULT_HEADER_INTERVAL: Duration = Duration::from_secs(30);

/// Default interval between data-phase timeout sweeps.
pub const DEFAULT_DATA_INTERVAL: Duration = Duration::from_secs(10);

/// Default maximum number of chunks enumerated per sync round.
pub const DEFAULT_MAX_CHUNKS_PER_SYNC: usize = 10;

/// Configuration for the sync task.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Number of blocks per chunk.
    pub chunk_size: u64,

    /// Number of chunk requests to put in flight when fetching starts.
    pub concurrent_requests: usize,

    /// How long a chunk request may stay unanswered before it is re-sent.
    pub chunk_data_timeout: Duration,

    /// How often the header phase re-sends its request when agreement is
    /// still missing.
    pub header_interval: Duration,

    /// How often the data phase sweeps for timed-out chunk requests.
    pub data_interval: Duration,

    /// Maximum chunks a responder enumerates per sync round.
    pub max_chunks_per_sync: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
            chunk_data_timeout: DEFAULT_CHUNK_DATA_TIMEOUT,
            header_interval: DEFAULT_HEADER_INTERVAL,
            data_interval: DEFAULT_DATA_INTERVAL,
            max_chunks_per_sync: DEFAULT_MAX_CHUNKS_PER_SYNC,
        }
    }
}

impl SyncConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of blocks per chunk.
    pub fn with_chunk_size(mut self, blocks: u64) -> Self {
        self.chunk_size = blocks;
        self
    }

    /// Set the initial in-flight request window.
    pub fn with_concurrent_requests(mut self, count: usize) -> Self {
        self.concurrent_requests = count;
        self
    }

    /// Set the chunk data timeout.
    pub fn with_chunk_data_timeout(mut self, timeout: Duration) -> Self {
        self.chunk_data_timeout = timeout;
        self
    }

    /// Set the header-phase retry interval.
    pub fn with_header_interval(mut self, interval: Duration) -> Self {
        self.header_interval = interval;
        self
    }

    /// Set the data-phase sweep interval.
    pub fn with_data_interval(mut self, interval: Duration) -> Self {
        self.data_interval = interval;
        self
    }

    /// Set the maximum chunks enumerated per sync round.
    pub fn with_max_chunks_per_sync(mut self, count: usize) -> Self {
        self.max_chunks_per_sync = count;
        self
    }
}

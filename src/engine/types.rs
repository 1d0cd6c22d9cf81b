//! Engine types
//!
//! Run statistics for the sync engine.

use std::collections::BTreeMap;

/// Statistics for one stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Records emitted
    pub records: u64,
    /// Pages fetched
    pub pages: u64,
    /// Transient failures retried
    pub retries: u64,
    /// Proactive rate-limit sleeps
    pub throttles: u64,
    /// Day buckets committed (date cursor only)
    pub days: u64,
}

impl StreamStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }
}

/// Statistics from a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Total records synced
    pub records_synced: u64,
    /// Total pages fetched
    pub pages_fetched: u64,
    /// Total streams synced
    pub streams_synced: usize,
    /// Total retries
    pub retries: u64,
    /// Total throttle sleeps
    pub throttles: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Per-stream breakdown
    pub streams: BTreeMap<String, StreamStats>,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one finished stream into the totals
    pub fn add_stream(&mut self, name: &str, stream: StreamStats) {
        self.records_synced += stream.records;
        self.pages_fetched += stream.pages;
        self.retries += stream.retries;
        self.throttles += stream.throttles;
        self.streams_synced += 1;
        self.streams.insert(name.to_string(), stream);
    }

    /// Stats for one stream
    pub fn stream(&self, name: &str) -> Option<&StreamStats> {
        self.streams.get(name)
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

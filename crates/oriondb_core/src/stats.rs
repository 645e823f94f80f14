//! Collection statistics.
//!
//! Counters are shared between a collection and its parallel-scan workers,
//! so they are atomics updated with relaxed ordering.
//!
//! # Usage
//!
//! ```rust,ignore
//! let users = db.select("users")?;
//! users.search(&query)?;
//!
//! let stats = users.stats();
//! println!("cache hits: {}", stats.cache_hits);
//! println!("shard reads: {}", stats.shard_reads);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters for one collection.
///
/// Values are monotonically increasing for the lifetime of the collection
/// handle; nothing is persisted.
#[derive(Debug, Default)]
pub struct CollectionStats {
    /// Shards decoded from the storage backend.
    shard_reads: AtomicU64,
    /// Shards encoded and written to the storage backend.
    shard_writes: AtomicU64,
    /// New shard files allocated.
    shards_created: AtomicU64,
    /// Shard lookups answered by the cache.
    cache_hits: AtomicU64,
    /// Shard lookups that fell through to storage.
    cache_misses: AtomicU64,
    /// Records accepted by inserts.
    records_inserted: AtomicU64,
    /// Records matched by updates.
    records_updated: AtomicU64,
    /// Records deleted by removals.
    records_removed: AtomicU64,
    /// Equality and regex scans started.
    scans: AtomicU64,
}

impl CollectionStats {
    /// Creates a zeroed stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_shard_read(&self) {
        self.shard_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_shard_write(&self) {
        self.shard_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_shard_created(&self) {
        self.shards_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_inserted(&self, count: usize) {
        self.records_inserted
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_updated(&self, count: usize) {
        self.records_updated
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_removed(&self, count: usize) {
        self.records_removed
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            shard_reads: self.shard_reads.load(Ordering::Relaxed),
            shard_writes: self.shard_writes.load(Ordering::Relaxed),
            shards_created: self.shards_created.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            records_inserted: self.records_inserted.load(Ordering::Relaxed),
            records_updated: self.records_updated.load(Ordering::Relaxed),
            records_removed: self.records_removed.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`CollectionStats`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub shard_reads: u64,
    pub shard_writes: u64,
    pub shards_created: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub records_inserted: u64,
    pub records_updated: u64,
    pub records_removed: u64,
    pub scans: u64,
}

impl StatsSnapshot {
    /// Fraction of shard lookups served from the cache, if any happened.
    #[allow(clippy::cast_precision_loss)]
    pub fn cache_hit_ratio(&self) -> Option<f64> {
        let total = self.cache_hits + self.cache_misses;
        (total > 0).then(|| self.cache_hits as f64 / total as f64)
    }
}

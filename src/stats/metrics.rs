//! Statistics for sessions, the quiz cache, and the server

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Session-level statistics
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Quiz the session belongs to
    pub quiz_id: String,
    /// Current participants
    pub participants: usize,
    /// Current subscribers
    pub subscribers: usize,
    /// Snapshots broadcast since creation
    pub broadcasts: u64,
    /// Snapshots evicted from full subscriber queues
    pub dropped_snapshots: u64,
    /// When the session was created
    pub created_at: DateTime<Utc>,
}

/// Quiz cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from a valid entry
    pub hits: u64,
    /// Reads that found no valid entry
    pub misses: u64,
    /// Loader invocations
    pub loads: u64,
    /// Loader invocations that failed
    pub load_failures: u64,
}

impl CacheStats {
    /// Fraction of reads served from cache (0.0 when nothing was read)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Live counters behind [`CacheStats`]
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    pub(crate) hits: AtomicU64,
    pub(crate) misses: AtomicU64,
    pub(crate) loads: AtomicU64,
    pub(crate) load_failures: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
        }
    }
}

/// Server-wide statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerStats {
    /// Total connections accepted
    pub total_connections: u64,
    /// Connections currently open
    pub active_connections: u64,
}

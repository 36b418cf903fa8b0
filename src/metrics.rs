//! Metrics collection for the ACL system.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for permission store operations.
///
/// The cache hit/miss counters are the observable signal for verifying that
/// repeated lookups are served from cache.
#[derive(Debug, Default)]
pub struct AclMetrics {
    /// Number of permission edges written (allow/deny/inherit).
    pub permission_writes: AtomicU64,
    /// Number of allowed-action lookups performed.
    pub lookups: AtomicU64,
    /// Number of lookups served from cache.
    pub cache_hits: AtomicU64,
    /// Number of lookups that had to recompute.
    pub cache_misses: AtomicU64,
    /// Number of namespace-wide cache clears issued.
    pub cache_clears: AtomicU64,
}

impl AclMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a permission edge write.
    pub fn record_permission_write(&self) {
        self.permission_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an allowed-action lookup.
    pub fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache hit.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss.
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a namespace-wide cache clear.
    pub fn record_cache_clear(&self) {
        self.cache_clears.fetch_add(1, Ordering::Relaxed);
    }

    /// Get cache hit ratio.
    pub fn cache_hit_ratio(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Get a point-in-time metrics summary.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            permission_writes: self.permission_writes.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_clears: self.cache_clears.load(Ordering::Relaxed),
            cache_hit_ratio: self.cache_hit_ratio(),
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        self.permission_writes.store(0, Ordering::Relaxed);
        self.lookups.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
        self.cache_clears.store(0, Ordering::Relaxed);
    }
}

/// Summary of metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub permission_writes: u64,
    pub lookups: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_clears: u64,
    pub cache_hit_ratio: f64,
}

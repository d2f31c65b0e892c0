//! Per-allocator operation counters.
//!
//! All counters use relaxed ordering — they are advisory/diagnostic,
//! not synchronization primitives.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by each allocator instance.
pub struct AllocMetrics {
    /// Total successful allocations.
    pub allocs: AtomicU64,
    /// Total frees.
    pub frees: AtomicU64,
    /// Bytes currently handed out.
    pub bytes_in_use: AtomicU64,
}

impl AllocMetrics {
    /// Create a new zeroed metrics instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            allocs: AtomicU64::new(0),
            frees: AtomicU64::new(0),
            bytes_in_use: AtomicU64::new(0),
        }
    }

    /// Record a successful allocation of `bytes`.
    pub fn on_alloc(&self, bytes: usize) {
        self.allocs.fetch_add(1, Ordering::Relaxed);
        self.bytes_in_use.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record a free of `bytes`.
    pub fn on_free(&self, bytes: usize) {
        self.frees.fetch_add(1, Ordering::Relaxed);
        self.bytes_in_use.fetch_sub(bytes as u64, Ordering::Relaxed);
    }

    /// Bytes currently in use.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.bytes_in_use.load(Ordering::Relaxed) as usize
    }

    /// Snapshot all counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            allocs: self.allocs.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
            bytes_in_use: self.bytes_in_use.load(Ordering::Relaxed),
        }
    }
}

impl Default for AllocMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`AllocMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub allocs: u64,
    pub frees: u64,
    pub bytes_in_use: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_track_alloc_free_pairs() {
        let m = AllocMetrics::new();
        m.on_alloc(128);
        m.on_alloc(64);
        m.on_free(128);

        let snap = m.snapshot();
        assert_eq!(snap.allocs, 2);
        assert_eq!(snap.frees, 1);
        assert_eq!(snap.bytes_in_use, 64);
        assert_eq!(m.in_use(), 64);
    }
}

//! Per-cell counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated by [`TtlCell::get`](crate::TtlCell::get).
#[derive(Debug, Default)]
pub(crate) struct CellStats {
    hits: AtomicU64,
    computations: AtomicU64,
    failures: AtomicU64,
    waits: AtomicU64,
}

impl CellStats {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_computation(&self) {
        self.computations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_wait(&self) {
        self.waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a cell's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Calls answered from the cached value.
    pub hits: u64,
    /// Computations started by an elected recomputer.
    pub computations: u64,
    /// Computations that returned an error.
    pub failures: u64,
    /// Times a caller lost the election and blocked on the recompute.
    pub waits: u64,
}

impl StatsSnapshot {
    /// Computations that did not return an error.
    pub fn successes(&self) -> u64 {
        self.computations.saturating_sub(self.failures)
    }

    /// Fraction of answered calls served from cache, in `[0, 1]`.
    pub fn hit_ratio(&self) -> f64 {
        let answered = self.hits + self.successes();
        if answered == 0 {
            0.0
        } else {
            self.hits as f64 / answered as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = CellStats::default();
        stats.record_hit();
        stats.record_hit();
        stats.record_computation();
        stats.record_computation();
        stats.record_failure();
        stats.record_wait();

        let snap = stats.snapshot();
        assert_eq!(snap.hits, 2);
        assert_eq!(snap.computations, 2);
        assert_eq!(snap.failures, 1);
        assert_eq!(snap.waits, 1);
        assert_eq!(snap.successes(), 1);
    }

    #[test]
    fn test_hit_ratio() {
        assert_eq!(StatsSnapshot::default().hit_ratio(), 0.0);

        let snap = StatsSnapshot {
            hits: 3,
            computations: 1,
            failures: 0,
            waits: 0,
        };
        assert!((snap.hit_ratio() - 0.75).abs() < f64::EPSILON);
    }
}

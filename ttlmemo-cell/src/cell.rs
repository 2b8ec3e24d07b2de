//! The TTL memo cell.

use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use ttlmemo_core::{Clock, Ttl};

use crate::stats::{CellStats, StatsSnapshot};

/// A value together with the instant it was computed.
///
/// Stored as one unit so readers never pair a value with another value's stamp.
#[derive(Clone, Debug, PartialEq)]
struct Stamped<T> {
    value: T,
    stamped_at: Instant,
}

/// Caches the last successful result of one zero-argument computation.
///
/// Concurrent callers that find the value stale race for a recompute lock.
/// Exactly one wins and runs the computation; the rest block until it
/// finishes and then re-check freshness. A failed computation leaves the
/// cached value and its stamp untouched.
///
/// Embed one cell per memoized computation in the owning type and delegate to
/// [`TtlCell::get`] from the accessor.
///
/// # Thread Safety
///
/// `TtlCell<T>` is `Send + Sync` whenever `T` is. The fast path takes only a
/// shared read lock on the cached pair and never waits on a computation.
#[derive(Debug)]
pub struct TtlCell<T> {
    /// Last successful result; written only while `recompute` is held.
    slot: RwLock<Option<Stamped<T>>>,
    /// Held by the elected recomputer for the duration of the computation.
    recompute: Mutex<()>,
    stats: CellStats,
}

impl<T> TtlCell<T> {
    /// Creates an empty cell. The first `get` always computes.
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
            recompute: Mutex::new(()),
            stats: CellStats::default(),
        }
    }

    /// Returns the cell's counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl<T: Clone> TtlCell<T> {
    /// Returns a value that was fresh at some point during this call.
    ///
    /// If the cached value is younger than `ttl` according to `clock`, it is
    /// returned without calling `compute`. Otherwise at most one caller runs
    /// `compute`; on success its result is cached with a stamp taken after the
    /// computation, on failure the error is returned to that caller only and
    /// the cache is left as it was. Callers that waited on a failed
    /// computation retry from the freshness check.
    ///
    /// # Deadlocks
    ///
    /// The recompute lock is not reentrant. If `compute` calls `get` on this
    /// same cell and the value is stale, the inner call blocks forever waiting
    /// for the outer one.
    pub fn get<E, F, C>(&self, compute: F, ttl: Ttl, clock: &C) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        C: Clock + ?Sized,
    {
        loop {
            if let Some(value) = self.fresh_value(ttl, clock) {
                self.stats.record_hit();
                return Ok(value);
            }

            match self.recompute.try_lock() {
                Some(_election) => {
                    // Another recomputer may have published and released
                    // between the freshness check and this try_lock.
                    if let Some(value) = self.fresh_value(ttl, clock) {
                        self.stats.record_hit();
                        return Ok(value);
                    }

                    self.stats.record_computation();
                    debug!(%ttl, "elected to recompute memoized value");

                    return match compute() {
                        Ok(value) => {
                            self.publish(value.clone(), clock.now());
                            Ok(value)
                        }
                        Err(err) => {
                            self.stats.record_failure();
                            debug!("memoized computation failed, cached value left untouched");
                            Err(err)
                        }
                    };
                }
                None => {
                    // Wait for the elected recomputer, then start over: it may
                    // have failed, in which case the value is still stale.
                    self.stats.record_wait();
                    trace!("recompute in flight, waiting");
                    drop(self.recompute.lock());
                }
            }
        }
    }

    fn fresh_value<C: Clock + ?Sized>(&self, ttl: Ttl, clock: &C) -> Option<T> {
        let slot = self.slot.read();
        let stamped = slot.as_ref()?;
        ttl.is_fresh(stamped.stamped_at, clock.now())
            .then(|| stamped.value.clone())
    }

    fn publish(&self, value: T, stamped_at: Instant) {
        *self.slot.write() = Some(Stamped { value, stamped_at });
        trace!("published memoized value");
    }
}

impl<T> Default for TtlCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

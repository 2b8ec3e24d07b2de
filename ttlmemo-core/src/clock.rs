//! Injected monotonic time sources.
//!
//! Memo cells never read the system clock directly; they receive a [`Clock`]
//! so tests can substitute a [`ManualClock`] and step time deterministically.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A non-decreasing source of `Instant`s.
///
/// Coarse clocks are fine: freshness is never guaranteed below the clock's
/// granularity.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// The process monotonic clock (`Instant::now`).
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Time is an offset from an anchor captured at construction. An optional
/// `step` is added on every read, so consecutive reads are strictly increasing
/// the way a real clock's are.
#[derive(Debug)]
pub struct ManualClock {
    anchor: Instant,
    /// Offset from `anchor`, in nanoseconds.
    offset_nanos: AtomicU64,
    /// Added to the offset on each `now()`, in nanoseconds.
    step_nanos: u64,
}

impl ManualClock {
    /// Creates a clock frozen at its anchor.
    pub fn new() -> Self {
        Self::with_step(Duration::ZERO)
    }

    /// Creates a clock that advances by `step` on every read.
    pub fn with_step(step: Duration) -> Self {
        Self {
            anchor: Instant::now(),
            offset_nanos: AtomicU64::new(0),
            step_nanos: duration_to_nanos(step),
        }
    }

    /// Moves the clock forward, saturating at the largest representable offset.
    pub fn advance(&self, by: Duration) {
        self.bump(duration_to_nanos(by));
    }

    /// Moves the clock to `elapsed` past its anchor.
    ///
    /// Earlier targets are ignored so the clock never runs backwards.
    pub fn set(&self, elapsed: Duration) {
        self.offset_nanos
            .fetch_max(duration_to_nanos(elapsed), Ordering::SeqCst);
    }

    /// Time elapsed since the anchor, without applying the read step.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }

    /// Adds `nanos` to the offset without wrapping; returns the new offset.
    fn bump(&self, nanos: u64) -> u64 {
        let prev = self
            .offset_nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
                Some(cur.saturating_add(nanos))
            })
            .unwrap_or_else(|cur| cur);
        prev.saturating_add(nanos)
    }

    /// The instant corresponding to `elapsed` past the anchor.
    pub fn instant_at(&self, elapsed: Duration) -> Instant {
        self.anchor + elapsed
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let nanos = if self.step_nanos == 0 {
            self.offset_nanos.load(Ordering::SeqCst)
        } else {
            self.bump(self.step_nanos)
        };
        self.anchor + Duration::from_nanos(nanos)
    }
}

fn duration_to_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

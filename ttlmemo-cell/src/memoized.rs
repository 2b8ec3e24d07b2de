//! A computation bound to its own memo cell.

use ttlmemo_core::{Clock, ClockKind, MemoConfig, MemoError, MonotonicClock, Result, Ttl};

use crate::cell::TtlCell;
use crate::stats::StatsSnapshot;

/// A zero-argument computation memoized behind a [`TtlCell`].
///
/// Bundles the cell with the computation, its TTL, and the clock, so callers
/// only ever see [`Memoized::get`]. Use a bare `TtlCell` field instead when the
/// computation needs `&self` of the owning type.
///
/// ```rust
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use ttlmemo_cell::{Memoized, Ttl};
///
/// let loads = AtomicU64::new(0);
/// let snapshot = Memoized::new(
///     || Ok::<_, std::io::Error>(loads.fetch_add(1, Ordering::SeqCst)),
///     Ttl::Forever,
/// );
///
/// assert_eq!(snapshot.get().unwrap(), 0);
/// assert_eq!(snapshot.get().unwrap(), 0);
/// assert_eq!(loads.load(Ordering::SeqCst), 1);
/// ```
pub struct Memoized<T, F, C = MonotonicClock> {
    cell: TtlCell<T>,
    compute: F,
    ttl: Ttl,
    clock: C,
}

impl<T: std::fmt::Debug, F, C: std::fmt::Debug> std::fmt::Debug for Memoized<T, F, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized")
            .field("cell", &self.cell)
            .field("ttl", &self.ttl)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<T, F> Memoized<T, F, MonotonicClock> {
    /// Memoizes `compute` on the process monotonic clock.
    pub fn new<E>(compute: F, ttl: Ttl) -> Self
    where
        F: Fn() -> std::result::Result<T, E>,
    {
        Self::with_clock(compute, ttl, MonotonicClock)
    }

    /// Memoizes `compute` with a TTL in fractional seconds.
    ///
    /// Fails immediately on a negative or NaN TTL.
    pub fn with_ttl_secs<E>(compute: F, ttl_secs: f64) -> Result<Self>
    where
        F: Fn() -> std::result::Result<T, E>,
    {
        Ok(Self::new(compute, Ttl::from_secs_f64(ttl_secs)?))
    }

    /// Memoizes `compute` with the TTL from `config`.
    ///
    /// Only [`ClockKind::Monotonic`] configs are accepted: a manual clock has
    /// to be owned by whoever advances it, so build those with
    /// [`Memoized::with_clock`].
    pub fn from_config<E>(compute: F, config: &MemoConfig) -> Result<Self>
    where
        F: Fn() -> std::result::Result<T, E>,
    {
        if config.clock != ClockKind::Monotonic {
            return Err(MemoError::ConfigError(format!(
                "{:?} clock cannot be built from config; pass it to with_clock",
                config.clock
            )));
        }
        Ok(Self::new(compute, config.ttl()?))
    }
}

impl<T, F, C: Clock> Memoized<T, F, C> {
    /// Memoizes `compute` on the given clock.
    pub fn with_clock<E>(compute: F, ttl: Ttl, clock: C) -> Self
    where
        F: Fn() -> std::result::Result<T, E>,
    {
        Self {
            cell: TtlCell::new(),
            compute,
            ttl,
            clock,
        }
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// The clock freshness is measured against.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Counters of the underlying cell.
    pub fn stats(&self) -> StatsSnapshot {
        self.cell.stats()
    }
}

impl<T, E, F, C> Memoized<T, F, C>
where
    T: Clone,
    F: Fn() -> std::result::Result<T, E>,
    C: Clock,
{
    /// Returns the memoized value, recomputing it if stale.
    ///
    /// See [`TtlCell::get`].
    pub fn get(&self) -> std::result::Result<T, E> {
        self.cell.get(&self.compute, self.ttl, &self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use ttlmemo_core::{ManualClock, MemoError};

    #[test]
    fn test_memoized_get() {
        let calls = AtomicU64::new(0);
        let clock = ManualClock::new();
        let memo = Memoized::with_clock(
            || Ok::<_, ()>(calls.fetch_add(1, Ordering::SeqCst) + 1),
            Ttl::from_secs(1),
            &clock,
        );

        assert_eq!(memo.get(), Ok(1));
        clock.advance(Duration::from_millis(500));
        assert_eq!(memo.get(), Ok(1));
        clock.advance(Duration::from_millis(500));
        assert_eq!(memo.get(), Ok(2));

        let stats = memo.stats();
        assert_eq!(stats.computations, 2);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_negative_ttl_fails_fast() {
        let result = Memoized::with_ttl_secs(|| Ok::<u8, ()>(0), -1.0);
        assert!(matches!(result, Err(MemoError::NegativeTtl(_))));
    }

    #[test]
    fn test_from_config() {
        let memo = Memoized::from_config(|| Ok::<u8, ()>(3), &MemoConfig::with_ttl_seconds(2.0)).unwrap();
        assert_eq!(memo.ttl(), Ttl::from_secs(2));
        assert_eq!(memo.get(), Ok(3));

        let forever = Memoized::from_config(|| Ok::<u8, ()>(3), &MemoConfig::default()).unwrap();
        assert!(forever.ttl().is_forever());
    }

    #[test]
    fn test_from_config_rejects_manual_clock() {
        let config = MemoConfig {
            ttl_seconds: Some(1.0),
            clock: ClockKind::Manual,
        };
        let err = Memoized::from_config(|| Ok::<u8, ()>(1), &config).unwrap_err();
        assert!(matches!(err, MemoError::ConfigError(_)));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_shared_clock_handle() {
        let clock = Arc::new(ManualClock::new());
        let memo = Memoized::with_clock(|| Ok::<_, ()>("v"), Ttl::from_secs(1), Arc::clone(&clock));

        assert_eq!(memo.get(), Ok("v"));
        clock.advance(Duration::from_secs(1));
        assert_eq!(memo.get(), Ok("v"));
        assert_eq!(memo.stats().computations, 2);
        assert_eq!(memo.clock().elapsed(), Duration::from_secs(1));
    }
}

//! # ttlmemo Cell
//!
//! Single-flight TTL memoization for zero-argument computations.
//!
//! A [`TtlCell`] caches the last successful result of one computation. Callers
//! that find it fresh get a clone without blocking; when it is stale exactly
//! one caller recomputes while the others wait and then re-check.
//!
//! ## Example
//!
//! Owning types hold one cell per memoized computation and delegate to it:
//!
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use ttlmemo_cell::{Clock, MonotonicClock, Ttl, TtlCell};
//!
//! struct ExchangeRates<C: Clock> {
//!     fetches: AtomicU64,
//!     latest: TtlCell<u64>,
//!     clock: C,
//! }
//!
//! impl<C: Clock> ExchangeRates<C> {
//!     fn fetch(&self) -> Result<u64, String> {
//!         Ok(self.fetches.fetch_add(1, Ordering::SeqCst) + 100)
//!     }
//!
//!     fn latest(&self) -> Result<u64, String> {
//!         self.latest.get(|| self.fetch(), Ttl::from_secs(30), &self.clock)
//!     }
//! }
//!
//! let rates = ExchangeRates {
//!     fetches: AtomicU64::new(0),
//!     latest: TtlCell::new(),
//!     clock: MonotonicClock,
//! };
//! assert_eq!(rates.latest(), Ok(100));
//! assert_eq!(rates.latest(), Ok(100));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cell;
mod memoized;
mod stats;


pub use cell::TtlCell;
pub use memoized::Memoized;
pub use stats::StatsSnapshot;

// Re-export the capabilities a cell is driven by
pub use ttlmemo_core::{Clock, ManualClock, MemoConfig, MemoError, MonotonicClock, Ttl};

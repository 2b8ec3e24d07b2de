//! # ttlmemo Core
//!
//! Core types, errors, and capabilities shared by the ttlmemo crates.
//!
//! - **Ttl**: how long a memoized value stays fresh, or `Ttl::Forever`
//! - **Clock**: injected monotonic time source (`MonotonicClock`, `ManualClock`)
//! - **Errors**: setup-time configuration errors
//! - **Config**: serde-loadable memoization settings
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use ttlmemo_core::{Clock, ManualClock, Ttl};
//!
//! let clock = ManualClock::new();
//! let stamped = clock.now();
//! clock.advance(Duration::from_millis(900));
//!
//! let ttl = Ttl::from_secs_f64(1.0).unwrap();
//! assert!(ttl.is_fresh(stamped, clock.now()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod clock;
pub mod config;
pub mod error;
pub mod ttl;

// Re-export commonly used items at crate root
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{ClockKind, MemoConfig};
pub use error::{MemoError, Result};
pub use ttl::Ttl;

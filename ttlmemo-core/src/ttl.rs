//! Time-to-live for memoized values.

use std::fmt;
use std::time::{Duration, Instant};

use crate::error::{MemoError, Result};

/// How long a computed value stays fresh.
///
/// A value stamped at `t` is fresh at `now` while `now - t < ttl`. A zero TTL
/// is therefore never fresh, and `Forever` is always fresh once computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Ttl {
    /// Fresh for the given duration after it was computed.
    After(Duration),
    /// Computed once, never recomputed.
    #[default]
    Forever,
}

impl Ttl {
    /// Builds a TTL from fractional seconds.
    ///
    /// `f64::INFINITY` maps to [`Ttl::Forever`]. Negative and NaN values are
    /// rejected so misconfiguration surfaces when the memoized value is set up,
    /// not on the first read.
    pub fn from_secs_f64(secs: f64) -> Result<Self> {
        if secs.is_nan() {
            return Err(MemoError::InvalidTtl("TTL is not a number".into()));
        }
        if secs < 0.0 {
            return Err(MemoError::NegativeTtl(secs));
        }
        if secs.is_infinite() {
            return Ok(Ttl::Forever);
        }
        Duration::try_from_secs_f64(secs)
            .map(Ttl::After)
            .map_err(|e| MemoError::InvalidTtl(format!("{secs}s: {e}")))
    }

    /// TTL of whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Ttl::After(Duration::from_secs(secs))
    }

    /// TTL of whole milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Ttl::After(Duration::from_millis(millis))
    }

    /// Returns the finite duration, or `None` for [`Ttl::Forever`].
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Ttl::After(d) => Some(*d),
            Ttl::Forever => None,
        }
    }

    /// Returns true if the TTL never expires.
    pub fn is_forever(&self) -> bool {
        matches!(self, Ttl::Forever)
    }

    /// Returns true if a value stamped at `stamped_at` is still usable at `now`.
    ///
    /// A clock reading earlier than the stamp counts as zero age.
    #[inline]
    pub fn is_fresh(&self, stamped_at: Instant, now: Instant) -> bool {
        match self {
            Ttl::After(ttl) => now.saturating_duration_since(stamped_at) < *ttl,
            Ttl::Forever => true,
        }
    }
}

impl From<Duration> for Ttl {
    fn from(d: Duration) -> Self {
        Ttl::After(d)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::After(d) => write!(f, "{d:?}"),
            Ttl::Forever => f.write_str("forever"),
        }
    }
}

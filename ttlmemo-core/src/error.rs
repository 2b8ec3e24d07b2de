//! Error types for ttlmemo.
//!
//! These cover setup-time failures only: an invalid TTL, unreadable
//! configuration. Failures of a memoized computation are never wrapped here;
//! they reach the caller as the computation's own error type.

use thiserror::Error;

/// Result type alias using `MemoError`.
pub type Result<T> = std::result::Result<T, MemoError>;

/// Error type for ttlmemo setup and configuration.
#[derive(Debug, Error)]
pub enum MemoError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// TTL below zero.
    #[error("Invalid TTL: {0}s is negative")]
    NegativeTtl(f64),

    /// TTL that is not a number or otherwise unusable.
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // LOADING ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl MemoError {
    /// Returns true if this error stems from invalid settings rather than I/O.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            MemoError::NegativeTtl(_) | MemoError::InvalidTtl(_) | MemoError::ConfigError(_)
        )
    }
}

//! Memoization settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MemoError, Result};
use crate::ttl::Ttl;

/// Environment variable overriding [`MemoConfig::ttl_seconds`].
///
/// `inf`, `forever`, or an empty value mean no expiry.
pub const TTL_ENV_VAR: &str = "TTLMEMO_TTL_SECONDS";

/// Which clock a memoized value should read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockKind {
    /// The process monotonic clock.
    #[default]
    Monotonic,
    /// A manually stepped clock (tests, replays). The caller must own it, so
    /// `Memoized::from_config` rejects this and `with_clock` takes the clock.
    Manual,
}

/// Memoization configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoConfig {
    /// TTL in seconds; `None` never expires.
    pub ttl_seconds: Option<f64>,
    /// Clock the memoized value reads.
    pub clock: ClockKind,
}

impl MemoConfig {
    /// Config with a finite TTL in seconds.
    pub fn with_ttl_seconds(secs: f64) -> Self {
        Self {
            ttl_seconds: Some(secs),
            ..Self::default()
        }
    }

    /// Parses a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Defaults, overridden by `TTLMEMO_TTL_SECONDS` when set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(TTL_ENV_VAR) {
            config.ttl_seconds = parse_ttl_seconds(&raw)?;
        }
        Ok(config)
    }

    /// Validated TTL.
    pub fn ttl(&self) -> Result<Ttl> {
        match self.ttl_seconds {
            Some(secs) => Ttl::from_secs_f64(secs),
            None => Ok(Ttl::Forever),
        }
    }
}

fn parse_ttl_seconds(raw: &str) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("forever") {
        return Ok(None);
    }
    let secs: f64 = raw
        .parse()
        .map_err(|_| MemoError::ConfigError(format!("{TTL_ENV_VAR}={raw:?} is not a number")))?;
    if secs.is_infinite() && secs > 0.0 {
        return Ok(None);
    }
    Ok(Some(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use test_case::test_case;

    #[test]
    fn test_default_config() {
        let config = MemoConfig::default();
        assert_eq!(config.ttl_seconds, None);
        assert_eq!(config.clock, ClockKind::Monotonic);
        assert_eq!(config.ttl().unwrap(), Ttl::Forever);
    }

    #[test]
    fn test_from_json() {
        let config = MemoConfig::from_json(r#"{"ttl_seconds": 1.5, "clock": "manual"}"#).unwrap();
        assert_eq!(config.clock, ClockKind::Manual);
        assert_eq!(config.ttl().unwrap(), Ttl::After(Duration::from_millis(1500)));
    }

    #[test]
    fn test_from_json_partial() {
        let config = MemoConfig::from_json(r#"{"ttl_seconds": 2}"#).unwrap();
        assert_eq!(config.clock, ClockKind::Monotonic);
        assert_eq!(config.ttl().unwrap(), Ttl::from_secs(2));
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            MemoConfig::from_json("{"),
            Err(MemoError::JsonError(_))
        ));
    }

    #[test]
    fn test_negative_ttl_fails_at_setup() {
        let config = MemoConfig::with_ttl_seconds(-3.0);
        let err = config.ttl().unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.json");
        std::fs::write(&path, r#"{"ttl_seconds": 0.5}"#).unwrap();

        let config = MemoConfig::from_file(&path).unwrap();
        assert_eq!(config.ttl().unwrap(), Ttl::from_millis(500));
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            MemoConfig::from_file(dir.path().join("absent.json")),
            Err(MemoError::IoError(_))
        ));
    }

    #[test_case("", None ; "empty")]
    #[test_case("forever", None ; "forever")]
    #[test_case("inf", None ; "inf")]
    #[test_case(" 2.5 ", Some(2.5) ; "padded number")]
    #[test_case("-1", Some(-1.0) ; "negative passes through to validation")]
    fn test_parse_ttl_seconds(raw: &str, expected: Option<f64>) {
        assert_eq!(parse_ttl_seconds(raw).unwrap(), expected);
    }

    #[test]
    fn test_parse_ttl_seconds_garbage() {
        assert!(matches!(
            parse_ttl_seconds("soon"),
            Err(MemoError::ConfigError(_))
        ));
    }
}

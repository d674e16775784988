//! Compressor configuration
//!
//! Tunables here trade compression ratio for speed. They only cap search
//! effort inside the match finder; the block format is fixed, so blocks
//! produced under any configuration decode identically.

use std::env;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreezipError};
use crate::format::MAX_MATCH_CANDIDATE_COUNT;

/// Configuration for [`Compressor`](crate::Compressor)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompressorConfig {
    /// Maximum number of dictionary nodes examined per input position
    /// (1 to [`MAX_MATCH_CANDIDATE_COUNT`])
    pub max_match_attempts: usize,

    /// Defer a match by one position when the next position's match is
    /// sufficiently better per coded byte
    pub lazy_matching: bool,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            max_match_attempts: MAX_MATCH_CANDIDATE_COUNT,
            lazy_matching: true,
        }
    }
}

impl CompressorConfig {
    /// Preset favoring throughput: shallow dictionary probes, no lazy
    /// look-ahead
    pub fn fast() -> Self {
        Self {
            max_match_attempts: 16,
            lazy_matching: false,
        }
    }

    /// Preset favoring ratio; currently identical to the default
    pub fn max_compression() -> Self {
        Self::default()
    }

    /// Build a configuration from `TREEZIP_`-prefixed environment
    /// variables, falling back to defaults for unset or unparsable values
    ///
    /// Recognized: `TREEZIP_MAX_MATCH_ATTEMPTS`, `TREEZIP_LAZY_MATCHING`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            max_match_attempts: parse_env_var(
                "TREEZIP_MAX_MATCH_ATTEMPTS",
                defaults.max_match_attempts,
            ),
            lazy_matching: parse_env_bool("TREEZIP_LAZY_MATCHING", defaults.lazy_matching),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_match_attempts == 0 || self.max_match_attempts > MAX_MATCH_CANDIDATE_COUNT {
            return Err(TreezipError::configuration(format!(
                "max_match_attempts must be between 1 and {}",
                MAX_MATCH_CANDIDATE_COUNT
            )));
        }
        Ok(())
    }
}

/// Parse an environment variable, falling back to `default` when unset or
/// unparsable
fn parse_env_var<T>(var_name: &str, default: T) -> T
where
    T: std::str::FromStr + Clone,
{
    env::var(var_name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Parse a boolean environment variable.
///
/// Accepts "true", "1", "yes", "on" (case-insensitive) as true; everything
/// else is false.
fn parse_env_bool(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .map(|s| {
            let s = s.to_lowercase();
            matches!(s.as_str(), "true" | "1" | "yes" | "on")
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CompressorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_match_attempts, MAX_MATCH_CANDIDATE_COUNT);
        assert!(config.lazy_matching);
    }

    #[test]
    fn test_presets() {
        let fast = CompressorConfig::fast();
        let max = CompressorConfig::max_compression();
        assert!(fast.validate().is_ok());
        assert!(max.validate().is_ok());
        assert!(fast.max_match_attempts < max.max_match_attempts);
        assert!(!fast.lazy_matching);
    }

    #[test]
    fn test_validation_rejects_bad_attempt_cap() {
        let mut config = CompressorConfig::default();
        config.max_match_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(TreezipError::Configuration { .. })
        ));

        config.max_match_attempts = MAX_MATCH_CANDIDATE_COUNT + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_env_bool_values() {
        assert!(parse_env_bool("TREEZIP_TEST_UNSET_VARIABLE", true));
        assert!(!parse_env_bool("TREEZIP_TEST_UNSET_VARIABLE", false));
    }
}

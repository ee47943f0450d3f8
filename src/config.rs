//! Forest configuration
//!
//! Stored as JSON. Missing fields fall back to their defaults, and a missing
//! file yields the default configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of generations the history driver keeps in memory by default
pub const DEFAULT_HISTORY_RETENTION: usize = 5;

/// Longest key, in bytes, accepted by `Forest::update` by default
pub const DEFAULT_MAX_KEY_LEN: usize = 256;

/// Upper bound on `max_key_len`: the bit length of any path must fit a `u32`
pub const MAX_KEY_LEN_LIMIT: usize = (u32::MAX / 8) as usize;

/// Tunables for a [`Forest`](crate::Forest) and its [`RootHistory`](crate::RootHistory)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// How many revisions `RootHistory` retains before forgetting the oldest
    pub history_retention: usize,
    /// Keys longer than this are rejected as invalid diffs
    pub max_key_len: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        ForestConfig {
            history_retention: DEFAULT_HISTORY_RETENTION,
            max_key_len: DEFAULT_MAX_KEY_LEN,
        }
    }
}

impl ForestConfig {
    /// Load config from a JSON file, or defaults if it doesn't exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ForestConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the limits a forest relies on
    pub fn validate(&self) -> Result<()> {
        if self.max_key_len == 0 {
            return Err(Error::Config("max_key_len must be at least 1".into()));
        }
        if self.max_key_len > MAX_KEY_LEN_LIMIT {
            return Err(Error::Config(format!(
                "max_key_len {} exceeds limit of {}",
                self.max_key_len, MAX_KEY_LEN_LIMIT
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = ForestConfig::load(dir.path().join("forest.json")).unwrap();
        assert_eq!(config, ForestConfig::default());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forest.json");
        let config = ForestConfig {
            history_retention: 12,
            max_key_len: 64,
        };
        config.save(&path).unwrap();
        assert_eq!(ForestConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forest.json");
        std::fs::write(&path, r#"{ "history_retention": 2 }"#).unwrap();
        let config = ForestConfig::load(&path).unwrap();
        assert_eq!(config.history_retention, 2);
        assert_eq!(config.max_key_len, DEFAULT_MAX_KEY_LEN);
    }

    #[test]
    fn test_zero_key_len_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forest.json");
        std::fs::write(&path, r#"{ "max_key_len": 0 }"#).unwrap();
        assert!(matches!(ForestConfig::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_key_len_bounded_by_path_length_prefix() {
        let at_limit = ForestConfig {
            max_key_len: MAX_KEY_LEN_LIMIT,
            ..ForestConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        let over = ForestConfig {
            max_key_len: MAX_KEY_LEN_LIMIT + 1,
            ..ForestConfig::default()
        };
        assert!(matches!(over.validate(), Err(Error::Config(_))));
        assert!((MAX_KEY_LEN_LIMIT * 8) as u64 <= u32::MAX as u64);
    }

    #[test]
    fn test_malformed_json_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forest.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(ForestConfig::load(&path), Err(Error::Json(_))));
    }
}

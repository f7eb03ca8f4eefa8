//! Sync Configuration
//!
//! Tunables for the debounce layer and the settle phase.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default trailing delay for coalesced mutations
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// How long the sync status reads "synced" before returning to idle
pub const DEFAULT_SYNCED_MS: u64 = 2000;

/// What happens to pending debounced calls when their owner goes away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TeardownPolicy {
    /// Cancel pending timers without firing (pending edits are lost)
    #[default]
    Discard,
    /// Fire every pending call immediately
    Flush,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    pub debounce_ms: u64,
    /// Fetch a fresh board after every settled mutation
    pub refetch_on_settle: bool,
    pub teardown: TeardownPolicy,
    pub synced_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            refetch_on_settle: true,
            teardown: TeardownPolicy::default(),
            synced_ms: DEFAULT_SYNCED_MS,
        }
    }
}

impl SyncConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn synced_duration(&self) -> Duration {
        Duration::from_millis(self.synced_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.debounce_delay(), Duration::from_millis(500));
        assert!(config.refetch_on_settle);
        assert_eq!(config.teardown, TeardownPolicy::Discard);
        assert_eq!(config.synced_duration(), Duration::from_millis(2000));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SyncConfig::from_json_str(r#"{"debounceMs": 250, "teardown": "flush", "syncedMs": 500}"#).unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.synced_ms, 500);
        assert!(config.refetch_on_settle);
        assert_eq!(config.teardown, TeardownPolicy::Flush);
    }

    #[test]
    fn test_invalid_json() {
        assert!(SyncConfig::from_json_str(r#"{"teardown": "later"}"#).is_err());
    }
}

//! Cache types

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// Directory used when the caller does not name one
pub const DEFAULT_CACHE_DIR: &str = ".gh-inspector-cache";

/// How often the background task removes expired rows
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// A stored row. Entries are replaced wholesale on `set`, never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry has expired relative to `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Options for opening a cache
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub directory: PathBuf,
    pub sweep_interval: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_CACHE_DIR),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = CacheOptions::default();
        assert_eq!(options.directory, PathBuf::from(".gh-inspector-cache"));
        assert_eq!(options.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_entry_expiry_boundary() {
        let now = Utc::now();
        let entry = CacheEntry {
            key: "k".to_string(),
            value: b"v".to_vec(),
            expires_at: now,
            created_at: now - chrono::Duration::seconds(10),
        };

        assert!(entry.is_expired_at(now));
        assert!(!entry.is_expired_at(now - chrono::Duration::milliseconds(1)));
    }
}

//! Cache sizing and layout configuration.

/// Default cache budget: 500 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 500 * 1024 * 1024;

/// Fraction of the budget freed beyond the incoming payload once eviction
/// triggers, so a burst of inserts doesn't evict on every call.
pub const EVICTION_HEADROOM_RATIO: f64 = 0.10;

/// Directory under the platform cache root holding payloads and the index.
pub const CACHE_DIR_NAME: &str = "media-cache";

/// Index file name inside the cache directory.
pub const INDEX_FILE_NAME: &str = "cache_index.json";

/// Sizing parameters for [`crate::MediaCache`](crate::store::MediaCache).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Total payload budget in bytes.
    pub max_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl CacheConfig {
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Bytes to free once an insert of `incoming` bytes triggers eviction.
    pub fn required_free(&self, incoming: u64) -> u64 {
        incoming + (self.max_bytes as f64 * EVICTION_HEADROOM_RATIO) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headroom_is_ten_percent_of_budget() {
        let config = CacheConfig::with_max_bytes(1000);
        assert_eq!(config.required_free(50), 150);
    }
}

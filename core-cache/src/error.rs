//! Error types for the binary object cache.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Internal cache failures.
///
/// These never cross the public API as errors: the cache degrades to a
/// miss or a no-op and logs instead. The type exists so internal helpers
/// can compose with `?`.
#[derive(Debug, Error)]
pub enum CacheError {
    // ========================================================================
    // Backend errors
    // ========================================================================
    #[error("Storage backend error: {0}")]
    Backend(#[from] bridge_traits::BridgeError),

    #[error("Cache index serialization failed: {0}")]
    Index(#[from] serde_json::Error),

    // ========================================================================
    // State errors
    // ========================================================================
    #[error("Cache has not been initialized")]
    NotInitialized,
}

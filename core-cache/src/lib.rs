//! # Core Cache
//!
//! Binary object cache for downloaded media payloads: size-bounded,
//! least-recently-used eviction, persisted across restarts through the
//! filesystem bridge. Strictly best-effort; a failing backend disables
//! the cache instead of failing playback.

pub mod config;
pub mod error;
pub mod store;

pub use config::{CacheConfig, DEFAULT_MAX_BYTES, EVICTION_HEADROOM_RATIO};
pub use error::{CacheError, Result};
pub use store::{CachedPayload, CacheStats, MediaCache};

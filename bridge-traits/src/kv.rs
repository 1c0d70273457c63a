//! Key-Value Persistence Abstraction
//!
//! Abstracts the host's small-string persistence surface:
//! - Web: localStorage
//! - Desktop: a JSON settings file
//! - Tests: in-memory map
//!
//! The contract is deliberately synchronous: callers (the playback state
//! store) perform atomic mutations with no suspension points, so the
//! persistence write must not introduce one. Implementations are expected to
//! be cheap per call and best-effort durable.
//!
//! # Example
//!
//! ```
//! use bridge_traits::kv::{KeyValueStore, MemoryKeyValueStore};
//!
//! let kv = MemoryKeyValueStore::new();
//! kv.set_item("volume", "0.7").unwrap();
//! assert_eq!(kv.get_item("volume").unwrap(), Some("0.7".to_string()));
//! ```

use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Synchronous string key-value storage.
///
/// Mirrors the browser storage contract: `get_item`/`set_item` over string
/// values, best-effort durability, quota failures surfaced as errors the
/// caller downgrades to warnings.
pub trait KeyValueStore: Send + Sync {
    /// Retrieve the value for a key, `None` if absent.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store a value under a key, overwriting any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-memory key-value store for tests and hosts without persistence.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let kv = MemoryKeyValueStore::new();
        assert_eq!(kv.get_item("missing").unwrap(), None);

        kv.set_item("a", "1").unwrap();
        assert_eq!(kv.get_item("a").unwrap(), Some("1".to_string()));

        kv.set_item("a", "2").unwrap();
        assert_eq!(kv.get_item("a").unwrap(), Some("2".to_string()));

        kv.remove_item("a").unwrap();
        assert_eq!(kv.get_item("a").unwrap(), None);
        // Removing again is fine
        kv.remove_item("a").unwrap();
    }
}

//! Key-Value Storage using a JSON settings file
//!
//! Desktop stand-in for the browser's localStorage: a single JSON object on
//! disk, rewritten on every mutation. Writes are synchronous by contract
//! (see `bridge_traits::kv`), so plain `std::fs` is used rather than
//! tokio's async filesystem.

use bridge_traits::{
    error::{BridgeError, Result},
    kv::KeyValueStore,
};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// File-backed key-value store.
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl FileKeyValueStore {
    /// Open (or create) a store at the given file path.
    ///
    /// An unreadable or malformed file starts the store empty rather than
    /// failing; persisted state is best-effort by contract.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(BridgeError::Io)?;
        }

        let entries = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = ?path, error = %e, "Settings file malformed, starting empty");
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };

        debug!(path = ?path, keys = entries.len(), "Opened key-value store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &Map<String, Value>) -> Result<()> {
        let text = serde_json::to_string(entries)
            .map_err(|e| BridgeError::OperationFailed(format!("Serialize settings: {}", e)))?;
        fs::write(&self.path, text).map_err(BridgeError::Io)
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock();
        Ok(entries.get(key).and_then(|v| v.as_str()).map(String::from))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), Value::String(value.to_string()));
        self.flush(&entries)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.remove(key);
        self.flush(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        {
            let kv = FileKeyValueStore::open(&path).unwrap();
            kv.set_item("repeat", "all").unwrap();
        }

        let kv = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(kv.get_item("repeat").unwrap(), Some("all".to_string()));

        kv.remove_item("repeat").unwrap();
        assert_eq!(kv.get_item("repeat").unwrap(), None);
    }

    #[test]
    fn malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json {{{").unwrap();

        let kv = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(kv.get_item("anything").unwrap(), None);
    }
}

//! # Binary Object Cache
//!
//! Size-bounded persistent byte cache for downloaded media payloads,
//! backed by the [`FileSystemAccess`] bridge. One payload file per entry
//! (SHA-256 hex of the media id) plus a JSON index carrying per-entry
//! metadata.
//!
//! The cache is an optimization layer: no public operation returns an
//! error. A failing backend flips the cache into disabled mode, where
//! every lookup is a miss and every store is a no-op, and playback
//! continues from the network.

use crate::config::{CacheConfig, CACHE_DIR_NAME, INDEX_FILE_NAME};
use crate::error::{CacheError, Result};
use bridge_traits::FileSystemAccess;
use bytes::Bytes;
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// A cached payload together with the mime type recorded at store time.
#[derive(Debug, Clone)]
pub struct CachedPayload {
    pub data: Bytes,
    pub mime_type: String,
}

/// Aggregate cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub count: usize,
    pub total_bytes: u64,
    pub max_bytes: u64,
}

/// Per-entry metadata persisted in the index file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    id: String,
    source_url: String,
    mime_type: String,
    size: u64,
    /// Payload file name relative to the cache directory.
    file: String,
    /// Epoch milliseconds.
    cached_at: i64,
    /// Epoch milliseconds, updated on every hit.
    last_accessed: i64,
}

#[derive(Default)]
struct CacheState {
    initialized: bool,
    /// Once false after initialization, every operation is a no-op.
    enabled: bool,
    dir: PathBuf,
    entries: HashMap<String, IndexEntry>,
}

impl CacheState {
    fn total_bytes(&self) -> u64 {
        self.entries.values().map(|e| e.size).sum()
    }
}

/// Size-bounded byte cache over the filesystem bridge.
pub struct MediaCache {
    fs: Arc<dyn FileSystemAccess>,
    config: CacheConfig,
    events: Option<EventBus>,
    state: Mutex<CacheState>,
}

impl MediaCache {
    pub fn new(fs: Arc<dyn FileSystemAccess>, config: CacheConfig) -> Self {
        Self {
            fs,
            config,
            events: None,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Attach an event bus; cache activity is then published as
    /// [`CacheEvent`]s.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: CacheEvent) {
        if let Some(bus) = &self.events {
            bus.emit(CoreEvent::Cache(event)).ok();
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Create the cache directory and load the index. Any backend failure
    /// leaves the cache in disabled mode; initialization never errors.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        let mut state = self.state.lock().await;
        if state.initialized {
            return;
        }
        state.initialized = true;

        match self.open_backend().await {
            Ok((dir, entries)) => {
                debug!(
                    entries = entries.len(),
                    dir = %dir.display(),
                    "Object cache ready"
                );
                state.dir = dir;
                state.entries = entries;
                state.enabled = true;
            }
            Err(e) => {
                warn!(error = %e, "Object cache backend unavailable, caching disabled");
                state.enabled = false;
                self.emit(CacheEvent::Disabled {
                    reason: e.to_string(),
                });
            }
        }
    }

    async fn open_backend(&self) -> Result<(PathBuf, HashMap<String, IndexEntry>)> {
        let dir = self.fs.get_cache_directory().await?.join(CACHE_DIR_NAME);
        self.fs.create_dir_all(&dir).await?;

        let index_path = dir.join(INDEX_FILE_NAME);
        let entries = if self.fs.exists(&index_path).await? {
            let raw = self.fs.read_file(&index_path).await?;
            match serde_json::from_slice::<Vec<IndexEntry>>(&raw) {
                Ok(list) => list.into_iter().map(|e| (e.id.clone(), e)).collect(),
                Err(e) => {
                    // A corrupt index only costs us the cached entries.
                    warn!(error = %e, "Cache index unreadable, starting empty");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok((dir, entries))
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Fetch a payload by media id. A hit refreshes the entry's recency; a
    /// corrupt or empty payload is deleted and reported as a miss.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Option<CachedPayload> {
        let mut state = self.state.lock().await;
        if !state.enabled {
            return None;
        }

        let Some(entry) = state.entries.get(id).cloned() else {
            self.emit(CacheEvent::Miss { id: id.to_string() });
            return None;
        };

        let path = state.dir.join(&entry.file);
        let data = match self.fs.read_file(&path).await {
            Ok(data) if !data.is_empty() => data,
            Ok(_) => {
                warn!(id, "Cached payload is empty, dropping entry");
                self.drop_entry(&mut state, id).await;
                self.emit(CacheEvent::Miss { id: id.to_string() });
                return None;
            }
            Err(e) => {
                warn!(id, error = %e, "Cached payload unreadable, dropping entry");
                self.drop_entry(&mut state, id).await;
                self.emit(CacheEvent::Miss { id: id.to_string() });
                return None;
            }
        };

        if let Some(live) = state.entries.get_mut(id) {
            live.last_accessed = now_ms();
        }
        self.persist_index(&state).await;

        self.emit(CacheEvent::Hit {
            id: id.to_string(),
            size: entry.size,
        });
        Some(CachedPayload {
            data,
            mime_type: entry.mime_type,
        })
    }

    /// Whether an entry exists, without refreshing its recency.
    pub async fn contains(&self, id: &str) -> bool {
        let state = self.state.lock().await;
        state.enabled && state.entries.contains_key(id)
    }

    /// Total payload bytes currently held.
    pub async fn cache_size(&self) -> u64 {
        self.state.lock().await.total_bytes()
    }

    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            count: state.entries.len(),
            total_bytes: state.total_bytes(),
            max_bytes: self.config.max_bytes,
        }
    }

    /// Directory currently backing the cache, for diagnostics.
    pub async fn directory(&self) -> Result<PathBuf> {
        let state = self.state.lock().await;
        if !state.initialized {
            return Err(CacheError::NotInitialized);
        }
        Ok(state.dir.clone())
    }

    // ========================================================================
    // Storage
    // ========================================================================

    /// Store a payload, evicting least-recently-used entries first when the
    /// budget would be exceeded. Failures are logged and swallowed; the
    /// cache never blocks playback.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn set(&self, id: &str, source_url: &str, data: Bytes, mime_type: &str) {
        let mut state = self.state.lock().await;
        if !state.enabled {
            return;
        }

        let size = data.len() as u64;
        if size > self.config.max_bytes {
            warn!(id, size, budget = self.config.max_bytes, "Payload exceeds cache budget, not caching");
            return;
        }
        if data.is_empty() {
            warn!(id, "Refusing to cache empty payload");
            return;
        }

        // Overwriting the same id releases its old footprint first.
        if state.entries.remove(id).is_some() {
            let path = state.dir.join(payload_file_name(id));
            if let Err(e) = self.fs.delete_file(&path).await {
                warn!(id, error = %e, "Failed to remove stale payload");
            }
        }

        self.ensure_space(&mut state, size).await;

        let file = payload_file_name(id);
        let path = state.dir.join(&file);
        if let Err(e) = self.fs.write_file(&path, data).await {
            warn!(id, error = %e, "Failed to write cache payload");
            return;
        }

        let now = now_ms();
        state.entries.insert(
            id.to_string(),
            IndexEntry {
                id: id.to_string(),
                source_url: source_url.to_string(),
                mime_type: mime_type.to_string(),
                size,
                file,
                cached_at: now,
                last_accessed: now,
            },
        );
        self.persist_index(&state).await;

        self.emit(CacheEvent::Stored {
            id: id.to_string(),
            size,
        });
    }

    /// Make room for `incoming` bytes. An insert that fits under the budget
    /// evicts nothing; once over, oldest-accessed entries go until
    /// `incoming` plus the configured headroom has been freed.
    async fn ensure_space(&self, state: &mut CacheState, incoming: u64) {
        if state.total_bytes() + incoming <= self.config.max_bytes {
            return;
        }
        let target_free = self.config.required_free(incoming);

        let mut victims: Vec<IndexEntry> = Vec::new();
        {
            let mut entries: Vec<&IndexEntry> = state.entries.values().collect();
            entries.sort_by_key(|e| e.last_accessed);
            let mut to_free = 0u64;
            for entry in entries {
                if to_free >= target_free {
                    break;
                }
                to_free += entry.size;
                victims.push(entry.clone());
            }
        }

        if victims.is_empty() {
            return;
        }

        let mut freed = 0u64;
        for victim in &victims {
            state.entries.remove(&victim.id);
            freed += victim.size;
            let path = state.dir.join(&victim.file);
            if let Err(e) = self.fs.delete_file(&path).await {
                warn!(id = %victim.id, error = %e, "Failed to delete evicted payload");
            }
        }

        debug!(count = victims.len(), freed, "Evicted cache entries");
        self.emit(CacheEvent::Evicted {
            count: victims.len(),
            bytes_freed: freed,
        });
    }

    /// Drop every entry and payload file.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        if !state.enabled {
            return;
        }

        let files: Vec<String> = state.entries.values().map(|e| e.file.clone()).collect();
        state.entries.clear();
        for file in files {
            let path = state.dir.join(&file);
            if let Err(e) = self.fs.delete_file(&path).await {
                warn!(file, error = %e, "Failed to delete payload during clear");
            }
        }
        self.persist_index(&state).await;
        self.emit(CacheEvent::Cleared);
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn drop_entry(&self, state: &mut CacheState, id: &str) {
        if let Some(entry) = state.entries.remove(id) {
            let path = state.dir.join(&entry.file);
            if let Err(e) = self.fs.delete_file(&path).await {
                warn!(id, error = %e, "Failed to delete corrupt payload");
            }
            self.persist_index(state).await;
        }
    }

    async fn persist_index(&self, state: &CacheState) {
        let list: Vec<&IndexEntry> = state.entries.values().collect();
        let json = match serde_json::to_vec(&list) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cache index");
                return;
            }
        };
        let path = state.dir.join(INDEX_FILE_NAME);
        if let Err(e) = self.fs.write_file(&path, Bytes::from(json)).await {
            warn!(error = %e, "Failed to write cache index");
        }
    }
}

/// Payload file name for a media id: SHA-256 hex plus a binary suffix.
fn payload_file_name(id: &str) -> String {
    let digest = Sha256::digest(id.as_bytes());
    let mut name = String::with_capacity(68);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(name, "{:02x}", byte);
    }
    name.push_str(".bin");
    name
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_file_name_is_stable_hex() {
        let a = payload_file_name("media-1");
        let b = payload_file_name("media-1");
        let c = payload_file_name("media-2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.ends_with(".bin"));
        assert_eq!(a.len(), 64 + 4);
    }
}

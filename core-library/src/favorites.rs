//! # Favorites
//!
//! Favorite flags per media item, remotely persisted with a local
//! key-value fallback. The local copy is provisional: it keeps the UI
//! working offline and across remote outages, and the remote table is
//! authoritative once reachable again.

use crate::error::{LibraryError, Result};
use bridge_traits::{KeyValueStore, QueryOptions, TableClient};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Remote table holding favorite rows.
pub const FAVORITES_TABLE: &str = "favorites";

/// Local fallback key: a JSON array of media ids.
const LOCAL_KEY: &str = "streamcore.favorites";

#[derive(Debug, Deserialize)]
struct FavoriteRow {
    id: String,
    media_id: String,
}

#[derive(Default)]
struct FavoriteSet {
    /// media id -> remote row id; rows created locally while the remote
    /// was unreachable have a generated id that may not exist remotely.
    rows: HashMap<String, String>,
    table_id: Option<String>,
}

/// Favorite flags with remote persistence and local fallback.
pub struct Favorites {
    tables: Arc<dyn TableClient>,
    kv: Arc<dyn KeyValueStore>,
    events: Option<EventBus>,
    set: Mutex<FavoriteSet>,
}

impl Favorites {
    pub fn new(tables: Arc<dyn TableClient>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            tables,
            kv,
            events: None,
            set: Mutex::new(FavoriteSet::default()),
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: LibraryEvent) {
        if let Some(bus) = &self.events {
            bus.emit(CoreEvent::Library(event)).ok();
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load favorites from the remote table, falling back to the local
    /// copy when the remote is unreachable. Never errors.
    #[instrument(skip(self))]
    pub async fn load(&self) {
        match self.load_remote().await {
            Ok(rows) => {
                debug!(count = rows.len(), "Favorites loaded from remote");
                let mut set = self.set.lock();
                set.rows = rows;
                drop(set);
                self.persist_local();
            }
            Err(e) => {
                warn!(error = %e, "Remote favorites unavailable, using local copy");
                let ids = self.load_local();
                let mut set = self.set.lock();
                set.rows = ids
                    .into_iter()
                    .map(|media_id| {
                        let row_id = uuid::Uuid::new_v4().to_string();
                        (media_id, row_id)
                    })
                    .collect();
            }
        }
    }

    async fn load_remote(&self) -> Result<HashMap<String, String>> {
        let table_id = self.table_id().await?;
        let response = self
            .tables
            .query_rows(&table_id, QueryOptions::default())
            .await?;

        let mut rows = HashMap::with_capacity(response.data.len());
        for row in response.data {
            match serde_json::from_value::<FavoriteRow>(row) {
                Ok(row) => {
                    rows.insert(row.media_id, row.id);
                }
                Err(e) => warn!(error = %e, "Skipping malformed favorite row"),
            }
        }
        Ok(rows)
    }

    async fn table_id(&self) -> Result<String> {
        if let Some(id) = self.set.lock().table_id.clone() {
            return Ok(id);
        }
        let tables = self.tables.list_tables().await?;
        let id = tables
            .into_iter()
            .find(|t| t.name == FAVORITES_TABLE)
            .map(|t| t.id)
            .ok_or_else(|| LibraryError::TableNotFound(FAVORITES_TABLE.to_string()))?;
        self.set.lock().table_id = Some(id.clone());
        Ok(id)
    }

    fn load_local(&self) -> Vec<String> {
        match self.kv.get_item(LOCAL_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Local favorites unreadable, starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read local favorites");
                Vec::new()
            }
        }
    }

    fn persist_local(&self) {
        let ids: Vec<String> = self.set.lock().rows.keys().cloned().collect();
        match serde_json::to_string(&ids) {
            Ok(json) => {
                if let Err(e) = self.kv.set_item(LOCAL_KEY, &json) {
                    warn!(error = %e, "Failed to persist local favorites");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize local favorites"),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn is_favorite(&self, media_id: &str) -> bool {
        self.set.lock().rows.contains_key(media_id)
    }

    pub fn favorite_ids(&self) -> Vec<String> {
        self.set.lock().rows.keys().cloned().collect()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Mark an item as favorite. The local set updates first; the remote
    /// insert is best-effort, and a duplicate-row rejection counts as
    /// success.
    #[instrument(skip(self))]
    pub async fn add(&self, media_id: &str) {
        let row_id = uuid::Uuid::new_v4().to_string();
        {
            let mut set = self.set.lock();
            if set.rows.contains_key(media_id) {
                return;
            }
            set.rows.insert(media_id.to_string(), row_id.clone());
        }
        self.persist_local();
        self.emit(LibraryEvent::FavoriteAdded {
            media_id: media_id.to_string(),
        });

        match self.insert_remote(media_id, &row_id).await {
            Ok(()) => {}
            Err(e) if is_duplicate(&e) => {
                debug!(media_id, "Favorite already exists remotely");
            }
            Err(e) => {
                warn!(media_id, error = %e, "Remote favorite insert failed, local copy kept");
            }
        }
    }

    async fn insert_remote(&self, media_id: &str, row_id: &str) -> Result<()> {
        let table_id = self.table_id().await?;
        let record = serde_json::json!({ "id": row_id, "media_id": media_id });
        self.tables.insert_row(&table_id, record).await?;
        Ok(())
    }

    /// Unmark an item. Local removal always succeeds; the remote delete is
    /// best-effort.
    #[instrument(skip(self))]
    pub async fn remove(&self, media_id: &str) {
        let row_id = { self.set.lock().rows.remove(media_id) };
        let Some(row_id) = row_id else {
            return;
        };
        self.persist_local();
        self.emit(LibraryEvent::FavoriteRemoved {
            media_id: media_id.to_string(),
        });

        match self.table_id().await {
            Ok(table_id) => {
                if let Err(e) = self.tables.delete_row(&table_id, &row_id).await {
                    warn!(media_id, error = %e, "Remote favorite delete failed, local removal kept");
                }
            }
            Err(e) => {
                warn!(media_id, error = %e, "Remote favorite delete failed, local removal kept");
            }
        }
    }

    /// Flip the favorite flag, returning the new state.
    pub async fn toggle(&self, media_id: &str) -> bool {
        if self.is_favorite(media_id) {
            self.remove(media_id).await;
            false
        } else {
            self.add(media_id).await;
            true
        }
    }
}

/// The remote collaborator rejects duplicate rows with a constraint
/// violation; treat that as the row already being present.
fn is_duplicate(error: &LibraryError) -> bool {
    let message = error.to_string().to_ascii_lowercase();
    message.contains("duplicate") || message.contains("unique") || message.contains("conflict")
}

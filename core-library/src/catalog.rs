//! # Media Catalog
//!
//! The remote media catalog: listing, ingestion, and deletion of media
//! items over the table and blob collaborators. Table and bucket names
//! are resolved to ids once and cached for the session.

use crate::error::{LibraryError, Result};
use bridge_traits::{BlobClient, QueryOptions, TableClient, UploadRequest};
use bytes::Bytes;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use core_state::{MediaItem, MediaKind};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Remote table holding catalog rows.
pub const MEDIA_TABLE: &str = "media_items";

/// Remote bucket holding media payloads.
pub const MEDIA_BUCKET: &str = "media-files";

/// Catalog row as stored remotely. Fields beyond the id and url are
/// tolerated missing so schema drift doesn't hide the whole catalog.
#[derive(Debug, Deserialize)]
struct MediaRow {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
    kind: MediaKind,
    #[serde(default)]
    cover: Option<String>,
    url: String,
    #[serde(default)]
    duration_seconds: f64,
}

impl From<MediaRow> for MediaItem {
    fn from(row: MediaRow) -> Self {
        MediaItem {
            id: row.id,
            title: row.title,
            artist: row.artist,
            kind: row.kind,
            cover: row.cover,
            url: row.url,
            duration_seconds: row.duration_seconds,
        }
    }
}

/// Everything needed to ingest one new media item.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub filename: String,
    pub data: Bytes,
    pub content_type: String,
    pub title: String,
    pub artist: String,
    pub kind: MediaKind,
    pub duration_seconds: f64,
    pub cover: Option<String>,
}

/// Catalog facade over the remote collaborators.
pub struct MediaCatalog {
    tables: Arc<dyn TableClient>,
    blobs: Arc<dyn BlobClient>,
    events: Option<EventBus>,
    table_ids: Mutex<HashMap<String, String>>,
    bucket_ids: Mutex<HashMap<String, String>>,
}

impl MediaCatalog {
    pub fn new(tables: Arc<dyn TableClient>, blobs: Arc<dyn BlobClient>) -> Self {
        Self {
            tables,
            blobs,
            events: None,
            table_ids: Mutex::new(HashMap::new()),
            bucket_ids: Mutex::new(HashMap::new()),
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
    // Name resolution
    // ========================================================================

    /// Table name to id, cached after the first listing.
    async fn table_id(&self, name: &str) -> Result<String> {
        if let Some(id) = self.table_ids.lock().get(name).cloned() {
            return Ok(id);
        }

        let tables = self.tables.list_tables().await?;
        let mut cache = self.table_ids.lock();
        for table in &tables {
            cache.insert(table.name.clone(), table.id.clone());
        }
        cache
            .get(name)
            .cloned()
            .ok_or_else(|| LibraryError::TableNotFound(name.to_string()))
    }

    /// Bucket name to id, cached after the first listing.
    async fn bucket_id(&self, name: &str) -> Result<String> {
        if let Some(id) = self.bucket_ids.lock().get(name).cloned() {
            return Ok(id);
        }

        let buckets = self.blobs.list_buckets().await?;
        let mut cache = self.bucket_ids.lock();
        for bucket in &buckets {
            cache.insert(bucket.name.clone(), bucket.id.clone());
        }
        cache
            .get(name)
            .cloned()
            .ok_or_else(|| LibraryError::BucketNotFound(name.to_string()))
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Fetch the catalog. Malformed rows are skipped with a warning so one
    /// bad record doesn't hide the library.
    #[instrument(skip(self))]
    pub async fn list_media(&self) -> Result<Vec<MediaItem>> {
        let table_id = self.table_id(MEDIA_TABLE).await?;
        let response = self
            .tables
            .query_rows(&table_id, QueryOptions::default())
            .await?;

        let mut items = Vec::with_capacity(response.data.len());
        for row in response.data {
            match serde_json::from_value::<MediaRow>(row) {
                Ok(row) => items.push(MediaItem::from(row)),
                Err(e) => warn!(error = %e, "Skipping malformed catalog row"),
            }
        }
        debug!(count = items.len(), "Catalog listed");
        Ok(items)
    }

    /// Upload the payload, then insert the catalog row. A failed insert
    /// after a successful upload leaves an orphan blob; the next ingest of
    /// the same filename overwrites it.
    #[instrument(skip(self, request), fields(filename = %request.filename))]
    pub async fn ingest(&self, request: IngestRequest) -> Result<MediaItem> {
        let bucket_id = self.bucket_id(MEDIA_BUCKET).await?;
        let upload = self
            .blobs
            .upload(
                &bucket_id,
                UploadRequest {
                    filename: request.filename,
                    data: request.data,
                    content_type: request.content_type,
                },
            )
            .await?;

        let item = MediaItem {
            id: uuid::Uuid::new_v4().to_string(),
            title: request.title,
            artist: request.artist,
            kind: request.kind,
            cover: request.cover,
            url: upload.path,
            duration_seconds: request.duration_seconds,
        };

        let table_id = self.table_id(MEDIA_TABLE).await?;
        let record = serde_json::to_value(&item)?;
        self.tables.insert_row(&table_id, record).await?;

        self.emit(LibraryEvent::ItemAdded {
            media_id: item.id.clone(),
            title: item.title.clone(),
        });
        Ok(item)
    }

    /// Remove a catalog row. The payload blob is left to remote lifecycle
    /// rules.
    #[instrument(skip(self))]
    pub async fn delete_media(&self, media_id: &str) -> Result<()> {
        let table_id = self.table_id(MEDIA_TABLE).await?;
        self.tables.delete_row(&table_id, media_id).await?;
        self.emit(LibraryEvent::ItemDeleted {
            media_id: media_id.to_string(),
        });
        Ok(())
    }
}

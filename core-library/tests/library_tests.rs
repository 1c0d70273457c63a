//! Integration tests for the catalog and favorites with mocked remote
//! collaborators.

use async_trait::async_trait;
use bridge_traits::{
    BlobClient, BridgeError, BucketInfo, KeyValueStore, MemoryKeyValueStore, QueryOptions,
    QueryResponse, TableClient, TableInfo, UploadRequest, UploadResponse,
};
use bytes::Bytes;
use core_library::{Favorites, IngestRequest, MediaCatalog};
use core_state::MediaKind;
use mockall::mock;
use mockall::predicate::eq;
use serde_json::json;
use std::sync::Arc;

mock! {
    Tables {}

    #[async_trait]
    impl TableClient for Tables {
        async fn list_tables(&self) -> bridge_traits::error::Result<Vec<TableInfo>>;
        async fn query_rows(
            &self,
            table_id: &str,
            options: QueryOptions,
        ) -> bridge_traits::error::Result<QueryResponse>;
        async fn insert_row(
            &self,
            table_id: &str,
            record: serde_json::Value,
        ) -> bridge_traits::error::Result<()>;
        async fn delete_row(&self, table_id: &str, row_id: &str) -> bridge_traits::error::Result<()>;
    }
}

mock! {
    Blobs {}

    #[async_trait]
    impl BlobClient for Blobs {
        async fn list_buckets(&self) -> bridge_traits::error::Result<Vec<BucketInfo>>;
        async fn download(&self, bucket_name: &str, path: &str) -> bridge_traits::error::Result<Bytes>;
        async fn upload(
            &self,
            bucket_id: &str,
            request: UploadRequest,
        ) -> bridge_traits::error::Result<UploadResponse>;
    }
}

fn media_table() -> Vec<TableInfo> {
    vec![
        TableInfo {
            id: "t-media".to_string(),
            name: "media_items".to_string(),
        },
        TableInfo {
            id: "t-favs".to_string(),
            name: "favorites".to_string(),
        },
    ]
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn list_media_parses_rows_and_skips_malformed() {
    let mut tables = MockTables::new();
    tables
        .expect_list_tables()
        .times(1)
        .returning(|| Ok(media_table()));
    tables.expect_query_rows().returning(|_, _| {
        Ok(QueryResponse {
            data: vec![
                json!({
                    "id": "m-1", "title": "Song", "artist": "Band",
                    "kind": "audio", "url": "uploads/song.mp3",
                    "duration_seconds": 180.0
                }),
                json!({ "this": "is not a media row" }),
                json!({
                    "id": "m-2", "kind": "video", "url": "uploads/clip.mp4"
                }),
            ],
        })
    });

    let catalog = MediaCatalog::new(Arc::new(tables), Arc::new(MockBlobs::new()));
    let items = catalog.list_media().await.unwrap();

    assert_eq!(items.len(), 2, "malformed row skipped");
    assert_eq!(items[0].id, "m-1");
    assert_eq!(items[1].id, "m-2");
    assert_eq!(items[1].title, "", "missing fields default");
    assert_eq!(items[1].kind, MediaKind::Video);
}

#[tokio::test]
async fn table_resolution_is_cached_across_calls() {
    let mut tables = MockTables::new();
    tables
        .expect_list_tables()
        .times(1)
        .returning(|| Ok(media_table()));
    tables
        .expect_query_rows()
        .with(eq("t-media"), mockall::predicate::always())
        .times(2)
        .returning(|_, _| Ok(QueryResponse::default()));

    let catalog = MediaCatalog::new(Arc::new(tables), Arc::new(MockBlobs::new()));
    catalog.list_media().await.unwrap();
    catalog.list_media().await.unwrap();
}

#[tokio::test]
async fn missing_table_is_reported() {
    let mut tables = MockTables::new();
    tables.expect_list_tables().returning(|| Ok(Vec::new()));

    let catalog = MediaCatalog::new(Arc::new(tables), Arc::new(MockBlobs::new()));
    let err = catalog.list_media().await.unwrap_err();
    assert!(err.to_string().contains("media_items"));
}

#[tokio::test]
async fn ingest_uploads_then_inserts_row() {
    let mut blobs = MockBlobs::new();
    blobs.expect_list_buckets().times(1).returning(|| {
        Ok(vec![BucketInfo {
            id: "b-media".to_string(),
            name: "media-files".to_string(),
        }])
    });
    blobs
        .expect_upload()
        .withf(|bucket_id, request| bucket_id == "b-media" && request.filename == "song.mp3")
        .times(1)
        .returning(|_, _| {
            Ok(UploadResponse {
                path: "uploads/song.mp3".to_string(),
            })
        });

    let mut tables = MockTables::new();
    tables
        .expect_list_tables()
        .returning(|| Ok(media_table()));
    tables
        .expect_insert_row()
        .withf(|table_id, record| {
            table_id == "t-media"
                && record["url"] == "uploads/song.mp3"
                && record["title"] == "Song"
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let catalog = MediaCatalog::new(Arc::new(tables), Arc::new(blobs));
    let item = catalog
        .ingest(IngestRequest {
            filename: "song.mp3".to_string(),
            data: Bytes::from_static(b"bytes"),
            content_type: "audio/mpeg".to_string(),
            title: "Song".to_string(),
            artist: "Band".to_string(),
            kind: MediaKind::Audio,
            duration_seconds: 180.0,
            cover: None,
        })
        .await
        .unwrap();

    assert_eq!(item.url, "uploads/song.mp3");
    assert!(!item.id.is_empty());
}

#[tokio::test]
async fn delete_media_removes_the_row() {
    let mut tables = MockTables::new();
    tables
        .expect_list_tables()
        .returning(|| Ok(media_table()));
    tables
        .expect_delete_row()
        .with(eq("t-media"), eq("m-1"))
        .times(1)
        .returning(|_, _| Ok(()));

    let catalog = MediaCatalog::new(Arc::new(tables), Arc::new(MockBlobs::new()));
    catalog.delete_media("m-1").await.unwrap();
}

// ============================================================================
// Favorites
// ============================================================================

#[tokio::test]
async fn favorites_load_from_remote_and_mirror_locally() {
    let mut tables = MockTables::new();
    tables
        .expect_list_tables()
        .returning(|| Ok(media_table()));
    tables.expect_query_rows().returning(|_, _| {
        Ok(QueryResponse {
            data: vec![
                json!({ "id": "r-1", "media_id": "m-1" }),
                json!({ "id": "r-2", "media_id": "m-2" }),
            ],
        })
    });

    let kv = Arc::new(MemoryKeyValueStore::new());
    let favorites = Favorites::new(Arc::new(tables), kv.clone());
    favorites.load().await;

    assert!(favorites.is_favorite("m-1"));
    assert!(favorites.is_favorite("m-2"));
    assert!(!favorites.is_favorite("m-3"));

    // Local mirror written for offline fallback.
    let local = kv.get_item("streamcore.favorites").unwrap().unwrap();
    let ids: Vec<String> = serde_json::from_str(&local).unwrap();
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn favorites_fall_back_to_local_copy_when_remote_fails() {
    let kv = Arc::new(MemoryKeyValueStore::new());
    kv.set_item("streamcore.favorites", r#"["m-7","m-8"]"#).unwrap();

    let mut tables = MockTables::new();
    tables
        .expect_list_tables()
        .returning(|| Err(BridgeError::RemoteError("offline".to_string())));

    let favorites = Favorites::new(Arc::new(tables), kv);
    favorites.load().await;

    assert!(favorites.is_favorite("m-7"));
    assert!(favorites.is_favorite("m-8"));
    assert_eq!(favorites.favorite_ids().len(), 2);
}

#[tokio::test]
async fn add_keeps_local_copy_when_remote_insert_fails() {
    let mut tables = MockTables::new();
    tables
        .expect_list_tables()
        .returning(|| Ok(media_table()));
    tables
        .expect_query_rows()
        .returning(|_, _| Ok(QueryResponse::default()));
    tables
        .expect_insert_row()
        .returning(|_, _| Err(BridgeError::RemoteError("offline".to_string())));

    let kv = Arc::new(MemoryKeyValueStore::new());
    let favorites = Favorites::new(Arc::new(tables), kv.clone());
    favorites.load().await;
    favorites.add("m-1").await;

    assert!(favorites.is_favorite("m-1"));
    let local = kv.get_item("streamcore.favorites").unwrap().unwrap();
    assert!(local.contains("m-1"));
}

#[tokio::test]
async fn duplicate_remote_insert_counts_as_success() {
    let mut tables = MockTables::new();
    tables
        .expect_list_tables()
        .returning(|| Ok(media_table()));
    tables
        .expect_query_rows()
        .returning(|_, _| Ok(QueryResponse::default()));
    tables.expect_insert_row().times(1).returning(|_, _| {
        Err(BridgeError::RemoteError(
            "duplicate key value violates unique constraint".to_string(),
        ))
    });

    let favorites = Favorites::new(Arc::new(tables), Arc::new(MemoryKeyValueStore::new()));
    favorites.load().await;
    favorites.add("m-1").await;
    assert!(favorites.is_favorite("m-1"));
}

#[tokio::test]
async fn remove_deletes_the_remote_row() {
    let mut tables = MockTables::new();
    tables
        .expect_list_tables()
        .returning(|| Ok(media_table()));
    tables.expect_query_rows().returning(|_, _| {
        Ok(QueryResponse {
            data: vec![json!({ "id": "r-1", "media_id": "m-1" })],
        })
    });
    tables
        .expect_delete_row()
        .with(eq("t-favs"), eq("r-1"))
        .times(1)
        .returning(|_, _| Ok(()));

    let favorites = Favorites::new(Arc::new(tables), Arc::new(MemoryKeyValueStore::new()));
    favorites.load().await;
    favorites.remove("m-1").await;
    assert!(!favorites.is_favorite("m-1"));
}

#[tokio::test]
async fn toggle_flips_the_flag() {
    let mut tables = MockTables::new();
    tables
        .expect_list_tables()
        .returning(|| Ok(media_table()));
    tables
        .expect_query_rows()
        .returning(|_, _| Ok(QueryResponse::default()));
    tables.expect_insert_row().returning(|_, _| Ok(()));
    tables.expect_delete_row().returning(|_, _| Ok(()));

    let favorites = Favorites::new(Arc::new(tables), Arc::new(MemoryKeyValueStore::new()));
    favorites.load().await;

    assert!(favorites.toggle("m-1").await);
    assert!(favorites.is_favorite("m-1"));
    assert!(!favorites.toggle("m-1").await);
    assert!(!favorites.is_favorite("m-1"));
}

//! Remote Backend Collaborators
//!
//! Contracts for the remote backend-as-a-service the application talks to:
//!
//! - [`TableClient`] — tabular data (media catalog rows, favorites rows).
//! - [`BlobClient`] — named binary objects in buckets (the media files
//!   themselves and cover images).
//!
//! Both collaborators are opaque network services from the core's point of
//! view; their failures are caught at the call site and converted to either a
//! logged warning (non-critical path) or a typed error (nothing playable).

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// =============================================================================
// Table collaborator
// =============================================================================

/// A table known to the remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub id: String,
    pub name: String,
}

/// Options for a row query.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// Maximum number of rows to return.
    pub page_size: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self { page_size: 1000 }
    }
}

/// A page of rows. Row shape is table-specific, so rows travel as JSON
/// objects and are decoded by the caller.
#[derive(Debug, Clone, Default)]
pub struct QueryResponse {
    pub data: Vec<serde_json::Value>,
}

/// Remote table/query collaborator.
#[async_trait]
pub trait TableClient: Send + Sync {
    /// List all tables visible to this client.
    async fn list_tables(&self) -> Result<Vec<TableInfo>>;

    /// Query rows from a table by table id.
    async fn query_rows(&self, table_id: &str, options: QueryOptions) -> Result<QueryResponse>;

    /// Insert a row into a table. The record is a JSON object.
    async fn insert_row(&self, table_id: &str, record: serde_json::Value) -> Result<()>;

    /// Delete a row by its id.
    async fn delete_row(&self, table_id: &str, row_id: &str) -> Result<()>;
}

// =============================================================================
// Blob collaborator
// =============================================================================

/// A bucket known to the remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    pub id: String,
    pub name: String,
}

/// A blob upload request.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub data: Bytes,
    pub content_type: String,
}

/// Result of an upload: the storage path the blob can be fetched back from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    pub path: String,
}

/// Remote blob storage collaborator.
#[async_trait]
pub trait BlobClient: Send + Sync {
    /// List all buckets visible to this client.
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>>;

    /// Download a blob by bucket name and path, returning raw bytes.
    async fn download(&self, bucket_name: &str, path: &str) -> Result<Bytes>;

    /// Upload a blob into a bucket by bucket id.
    async fn upload(&self, bucket_id: &str, request: UploadRequest) -> Result<UploadResponse>;
}

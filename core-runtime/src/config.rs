//! # Core Configuration Module
//!
//! Builder for the dependency set the playback core is composed from at
//! startup. Enforces fail-fast validation: required bridges must be present
//! before `build()` succeeds, with actionable error messages when they are
//! missing.
//!
//! ## Required Dependencies
//!
//! - `KeyValueStore` — snapshot persistence for the playback state store
//! - `FileSystemAccess` — backing store for the binary object cache
//! - `MediaEngine` — the decode/render surface the transport drives
//!
//! ## Optional Dependencies
//!
//! - `TableClient` / `BlobClient` — remote catalog and media download;
//!   without a `BlobClient` only absolute-URL items are playable.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .key_value_store(Arc::new(kv))
//!     .file_system(Arc::new(fs))
//!     .media_engine(Arc::new(engine))
//!     .blob_client(Arc::new(blobs))
//!     .cache_size_mb(500)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{BlobClient, FileSystemAccess, KeyValueStore, MediaEngine, TableClient};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default object cache budget: 500 MiB.
pub const DEFAULT_CACHE_SIZE_BYTES: u64 = 500 * 1024 * 1024;

/// Default remote download timeout.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Default bucket holding media payloads.
pub const DEFAULT_MEDIA_BUCKET: &str = "media-files";

/// Assembled dependency set for the playback core.
#[derive(Clone)]
pub struct CoreConfig {
    pub key_value_store: Arc<dyn KeyValueStore>,
    pub file_system: Arc<dyn FileSystemAccess>,
    pub media_engine: Arc<dyn MediaEngine>,
    pub table_client: Option<Arc<dyn TableClient>>,
    pub blob_client: Option<Arc<dyn BlobClient>>,
    /// Object cache budget in bytes.
    pub cache_size_bytes: u64,
    /// Bucket name media payloads are downloaded from.
    pub media_bucket: String,
    /// Timeout for a single remote media download.
    pub download_timeout: Duration,
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("table_client", &self.table_client.is_some())
            .field("blob_client", &self.blob_client.is_some())
            .field("cache_size_bytes", &self.cache_size_bytes)
            .field("media_bucket", &self.media_bucket)
            .field("download_timeout", &self.download_timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    key_value_store: Option<Arc<dyn KeyValueStore>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    media_engine: Option<Arc<dyn MediaEngine>>,
    table_client: Option<Arc<dyn TableClient>>,
    blob_client: Option<Arc<dyn BlobClient>>,
    cache_size_bytes: Option<u64>,
    media_bucket: Option<String>,
    download_timeout: Option<Duration>,
}

impl CoreConfigBuilder {
    pub fn key_value_store(mut self, kv: Arc<dyn KeyValueStore>) -> Self {
        self.key_value_store = Some(kv);
        self
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    pub fn media_engine(mut self, engine: Arc<dyn MediaEngine>) -> Self {
        self.media_engine = Some(engine);
        self
    }

    pub fn table_client(mut self, client: Arc<dyn TableClient>) -> Self {
        self.table_client = Some(client);
        self
    }

    pub fn blob_client(mut self, client: Arc<dyn BlobClient>) -> Self {
        self.blob_client = Some(client);
        self
    }

    pub fn cache_size_mb(mut self, mb: u64) -> Self {
        self.cache_size_bytes = Some(mb * 1024 * 1024);
        self
    }

    pub fn media_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.media_bucket = Some(bucket.into());
        self
    }

    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = Some(timeout);
        self
    }

    /// Validate and assemble the configuration.
    pub fn build(self) -> Result<CoreConfig> {
        let key_value_store = self
            .key_value_store
            .ok_or(Error::MissingCapability("KeyValueStore"))?;
        let file_system = self
            .file_system
            .ok_or(Error::MissingCapability("FileSystemAccess"))?;
        let media_engine = self
            .media_engine
            .ok_or(Error::MissingCapability("MediaEngine"))?;

        let cache_size_bytes = self.cache_size_bytes.unwrap_or(DEFAULT_CACHE_SIZE_BYTES);
        if cache_size_bytes == 0 {
            return Err(Error::InvalidConfig(
                "cache_size_bytes must be greater than 0".to_string(),
            ));
        }

        let media_bucket = self
            .media_bucket
            .unwrap_or_else(|| DEFAULT_MEDIA_BUCKET.to_string());
        if media_bucket.is_empty() {
            return Err(Error::InvalidConfig(
                "media_bucket cannot be empty".to_string(),
            ));
        }

        Ok(CoreConfig {
            key_value_store,
            file_system,
            media_engine,
            table_client: self.table_client,
            blob_client: self.blob_client,
            cache_size_bytes,
            media_bucket,
            download_timeout: self.download_timeout.unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{MediaSource, MemoryKeyValueStore};
    use bytes::Bytes;
    use std::path::{Path, PathBuf};

    struct NoopFileSystem;

    #[async_trait]
    impl FileSystemAccess for NoopFileSystem {
        async fn get_cache_directory(&self) -> bridge_traits::error::Result<PathBuf> {
            Ok(PathBuf::from("/tmp"))
        }
        async fn exists(&self, _: &Path) -> bridge_traits::error::Result<bool> {
            Ok(false)
        }
        async fn metadata(
            &self,
            _: &Path,
        ) -> bridge_traits::error::Result<bridge_traits::FileMetadata> {
            Ok(bridge_traits::FileMetadata {
                size: 0,
                modified_at: None,
                is_directory: false,
            })
        }
        async fn create_dir_all(&self, _: &Path) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn read_file(&self, _: &Path) -> bridge_traits::error::Result<Bytes> {
            Ok(Bytes::new())
        }
        async fn write_file(&self, _: &Path, _: Bytes) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn delete_file(&self, _: &Path) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn list_directory(
            &self,
            _: &Path,
        ) -> bridge_traits::error::Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    struct NoopEngine;

    #[async_trait]
    impl MediaEngine for NoopEngine {
        async fn load(&self, _: MediaSource) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn play(&self) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn pause(&self) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn stop(&self) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn seek(&self, _: Duration) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn set_volume(&self, _: f32) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn position(&self) -> bridge_traits::error::Result<Duration> {
            Ok(Duration::ZERO)
        }
    }

    #[test]
    fn missing_required_bridges_are_reported() {
        let err = CoreConfig::builder().build().unwrap_err();
        assert!(matches!(err, Error::MissingCapability("KeyValueStore")));

        let err = CoreConfig::builder()
            .key_value_store(Arc::new(MemoryKeyValueStore::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingCapability("FileSystemAccess")));
    }

    #[test]
    fn complete_builder_applies_defaults_and_debug_formats() {
        let config = CoreConfig::builder()
            .key_value_store(Arc::new(MemoryKeyValueStore::new()))
            .file_system(Arc::new(NoopFileSystem))
            .media_engine(Arc::new(NoopEngine))
            .build()
            .unwrap();

        assert_eq!(config.cache_size_bytes, DEFAULT_CACHE_SIZE_BYTES);
        assert_eq!(config.media_bucket, DEFAULT_MEDIA_BUCKET);
        assert_eq!(config.download_timeout, DEFAULT_DOWNLOAD_TIMEOUT);

        let rendered = format!("{:?}", config);
        assert!(rendered.contains("media-files"));
        assert!(rendered.contains("blob_client: false"));
    }
}

//! File System Abstraction
//!
//! Platform-agnostic file I/O used by the binary object cache to persist
//! payloads and its index:
//! - Desktop: direct filesystem access
//! - Web: OPFS/IndexedDB-backed adapter
//! - Tests: a temp directory behind the desktop implementation

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn persist(fs: &dyn FileSystemAccess, data: bytes::Bytes) -> bridge_traits::error::Result<()> {
///     let dir = fs.get_cache_directory().await?;
///     fs.create_dir_all(&dir).await?;
///     fs.write_file(&dir.join("payload.bin"), data).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Get the application's cache directory.
    ///
    /// Suitable for data the host may reclaim when storage is low.
    async fn get_cache_directory(&self) -> Result<PathBuf>;

    /// Check if a file or directory exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory.
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a directory and all parents if they don't exist.
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Read entire file contents into memory.
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, creating it if it doesn't exist.
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Delete a file.
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// List all entries in a directory.
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_metadata_fields() {
        let metadata = FileMetadata {
            size: 1024,
            modified_at: Some(1234567890),
            is_directory: false,
        };

        assert_eq!(metadata.size, 1024);
        assert!(!metadata.is_directory);
    }
}

//! # Bridge Traits
//!
//! Platform and collaborator abstractions for the Streamcore playback core.
//! The core crates depend only on these traits; hosts provide concrete
//! implementations (see `bridge-desktop` for the desktop set).
//!
//! ## Modules
//!
//! - [`kv`] — synchronous string key-value persistence (localStorage-shaped)
//! - [`storage`] — async file I/O used by the binary object cache
//! - [`remote`] — remote table/query and blob storage collaborators
//! - [`engine`] — the media decode/render engine seam
//! - [`error`] — shared bridge error type

pub mod engine;
pub mod error;
pub mod kv;
pub mod remote;
pub mod storage;

pub use engine::{MediaEngine, MediaSource};
pub use error::{BridgeError, Result};
pub use kv::{KeyValueStore, MemoryKeyValueStore};
pub use remote::{
    BlobClient, BucketInfo, QueryOptions, QueryResponse, TableClient, TableInfo, UploadRequest,
    UploadResponse,
};
pub use storage::{FileMetadata, FileSystemAccess};

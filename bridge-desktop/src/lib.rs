//! # Bridge Desktop
//!
//! Desktop implementations of the `bridge-traits` abstractions:
//!
//! - [`TokioFileSystem`] — `FileSystemAccess` over `tokio::fs`
//! - [`FileKeyValueStore`] — `KeyValueStore` over a JSON settings file

pub mod filesystem;
pub mod kv;

pub use filesystem::TokioFileSystem;
pub use kv::FileKeyValueStore;

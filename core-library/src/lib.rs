//! # Core Library
//!
//! Media catalog and favorites over the remote collaborators: listing,
//! ingestion, and deletion of catalog rows, plus favorite flags with a
//! local fallback for remote outages.

pub mod catalog;
pub mod error;
pub mod favorites;

pub use catalog::{IngestRequest, MediaCatalog, MEDIA_BUCKET, MEDIA_TABLE};
pub use error::{LibraryError, Result};
pub use favorites::{Favorites, FAVORITES_TABLE};

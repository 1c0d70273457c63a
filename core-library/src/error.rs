//! Error types for the media catalog and favorites.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LibraryError>;

#[derive(Debug, Error)]
pub enum LibraryError {
    // ========================================================================
    // Resolution errors
    // ========================================================================
    #[error("Remote table '{0}' does not exist")]
    TableNotFound(String),

    #[error("Remote bucket '{0}' does not exist")]
    BucketNotFound(String),

    // ========================================================================
    // Collaborator errors
    // ========================================================================
    #[error("Remote collaborator error: {0}")]
    Remote(#[from] bridge_traits::BridgeError),

    #[error("Record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LibraryError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LibraryError::Remote(e) => e.is_transient(),
            _ => false,
        }
    }
}

//! Error types for the transport controller.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

/// Failures of byte resolution and engine control.
#[derive(Debug, Error)]
pub enum TransportError {
    // ========================================================================
    // Resolution errors
    // ========================================================================
    /// No blob collaborator is configured and the item is not an absolute
    /// URL, so there is nothing playable.
    #[error("No remote storage configured for item '{media_id}'")]
    NoRemoteStorage { media_id: String },

    /// The remote download returned zero bytes.
    #[error("Downloaded media '{path}' is empty")]
    EmptyPayload { path: String },

    /// The remote download did not finish within the configured timeout.
    #[error("Download of '{path}' timed out after {seconds}s")]
    DownloadTimeout { path: String, seconds: u64 },

    /// The blob collaborator failed the download.
    #[error("Media download failed: {0}")]
    Download(#[source] bridge_traits::BridgeError),

    // ========================================================================
    // Engine errors
    // ========================================================================
    /// The decode/render engine rejected a control call.
    #[error("Media engine error: {0}")]
    Engine(#[source] bridge_traits::BridgeError),
}

impl TransportError {
    /// Whether a retry with the same item could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::DownloadTimeout { .. } | TransportError::Download(_) => true,
            TransportError::Engine(e) => e.is_transient(),
            TransportError::NoRemoteStorage { .. } | TransportError::EmptyPayload { .. } => false,
        }
    }
}

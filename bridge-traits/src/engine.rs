//! Media Engine Abstraction
//!
//! The seam between the transport controller and the platform's actual
//! decode/render surface (an HTML media element, a native player, a headless
//! test stub). The controller resolves a [`MediaSource`], hands it to the
//! engine, and drives play/pause/seek/volume; the host forwards the engine's
//! time-update / ended / error callbacks back into the controller.
//!
//! Playback control methods should be fast and non-blocking; position queries
//! are expected to be cheap enough to call on every UI tick.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::Result;

/// Source of media bytes for the engine.
///
/// - A direct network URL the engine streams itself (no local caching).
/// - An in-memory payload with its mime type, typically resolved through the
///   object cache or a completed download. The engine owns any handle it
///   allocates for the payload (e.g. a blob URL) and must release it on
///   `stop` or on the next `load`.
#[derive(Debug, Clone)]
pub enum MediaSource {
    /// Absolute network address the engine fetches directly.
    RemoteUrl { url: String },

    /// Pre-fetched media payload held in memory.
    Payload { data: Bytes, mime_type: String },
}

impl MediaSource {
    /// Returns `true` if this source requires network access by the engine.
    pub fn is_remote(&self) -> bool {
        matches!(self, MediaSource::RemoteUrl { .. })
    }

    /// Returns the payload size in bytes, if the bytes are already local.
    pub fn payload_size(&self) -> Option<usize> {
        match self {
            MediaSource::Payload { data, .. } => Some(data.len()),
            _ => None,
        }
    }
}

/// Platform decode/render engine.
///
/// One instance backs one playback surface. Loading a new source while a
/// previous one is active tears the previous one down, releasing any
/// locally-allocated byte handle on every exit path.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Load a source, replacing any current one. Does not start playback.
    async fn load(&self, source: MediaSource) -> Result<()>;

    /// Begin or continue playback of the loaded source.
    async fn play(&self) -> Result<()>;

    /// Pause without releasing the source.
    async fn pause(&self) -> Result<()>;

    /// Stop playback and release the source and any allocated handles.
    async fn stop(&self) -> Result<()>;

    /// Seek to an absolute position in the loaded source.
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Set volume in `[0.0, 1.0]`.
    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Current playhead position.
    async fn position(&self) -> Result<Duration>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_source_classification() {
        let remote = MediaSource::RemoteUrl {
            url: "https://example.com/track.mp3".to_string(),
        };
        assert!(remote.is_remote());
        assert_eq!(remote.payload_size(), None);

        let payload = MediaSource::Payload {
            data: Bytes::from_static(&[1, 2, 3, 4]),
            mime_type: "audio/mpeg".to_string(),
        };
        assert!(!payload.is_remote());
        assert_eq!(payload.payload_size(), Some(4));
    }
}

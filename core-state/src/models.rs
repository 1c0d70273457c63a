//! Data model for the playback core.

use serde::{Deserialize, Serialize};

/// Kind of playable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

/// Immutable description of a playable asset.
///
/// Created at ingestion, never mutated afterwards. `url` is either an
/// absolute network address (played directly) or an opaque storage path
/// resolved through the blob collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub kind: MediaKind,
    pub cover: Option<String>,
    pub url: String,
    /// Authoritative duration estimate in seconds.
    pub duration_seconds: f64,
}

impl MediaItem {
    /// Key used for object-cache lookups: the stable id, falling back to
    /// the storage url when the id is empty.
    pub fn cache_key(&self) -> &str {
        if self.id.is_empty() {
            &self.url
        } else {
            &self.id
        }
    }
}

/// Repeat behavior of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    Off,
    All,
    One,
}

impl RepeatMode {
    /// Cycle order: off -> all -> one -> off.
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// The single authoritative playback state.
///
/// Invariants (maintained by the store, the only writer):
/// - `0 <= queue_index < queue.len()` whenever the queue is non-empty
/// - `queue_index == -1` iff the queue is empty
/// - `current_track == queue[queue_index]` whenever both are defined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub current_track: Option<MediaItem>,
    pub current_track_id: Option<String>,
    pub position_seconds: f64,
    pub queue: Vec<MediaItem>,
    /// Pointer into `queue`; -1 when the queue is empty.
    pub queue_index: isize,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    /// Volume in `[0.0, 1.0]`.
    pub volume: f32,
    /// Transient: never trusted across reloads, always restored as `false`.
    pub is_playing: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_track: None,
            current_track_id: None,
            position_seconds: 0.0,
            queue: Vec::new(),
            queue_index: -1,
            shuffle: false,
            repeat: RepeatMode::Off,
            volume: 0.7,
            is_playing: false,
        }
    }
}

impl PlaybackState {
    /// The queue index as a usable index, `None` when the queue is empty.
    pub fn current_index(&self) -> Option<usize> {
        if self.queue_index >= 0 && (self.queue_index as usize) < self.queue.len() {
            Some(self.queue_index as usize)
        } else {
            None
        }
    }
}

/// Persisted playhead for a partially watched video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchProgress {
    pub media_id: String,
    pub position_seconds: f64,
    /// Set once >= 95% has been watched; completion resets the stored
    /// position to 0 so a finished item doesn't resume mid-way.
    pub completed: bool,
    /// Last update, epoch milliseconds.
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            title: format!("Title {}", id),
            artist: "Artist".to_string(),
            kind: MediaKind::Audio,
            cover: None,
            url: format!("uploads/{}.mp3", id),
            duration_seconds: 180.0,
        }
    }

    #[test]
    fn repeat_mode_cycle() {
        assert_eq!(RepeatMode::Off.cycled(), RepeatMode::All);
        assert_eq!(RepeatMode::All.cycled(), RepeatMode::One);
        assert_eq!(RepeatMode::One.cycled(), RepeatMode::Off);
    }

    #[test]
    fn default_state_is_empty() {
        let state = PlaybackState::default();
        assert_eq!(state.queue_index, -1);
        assert_eq!(state.current_index(), None);
        assert_eq!(state.volume, 0.7);
        assert!(!state.is_playing);
    }

    #[test]
    fn cache_key_falls_back_to_url() {
        let mut m = item("a");
        assert_eq!(m.cache_key(), "a");
        m.id.clear();
        assert_eq!(m.cache_key(), "uploads/a.mp3");
    }

    #[test]
    fn media_item_serde_roundtrip() {
        let m = item("x");
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"audio\""));
        let back: MediaItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}

//! # Playback State Store
//!
//! The single source of truth for queue, transport state, and per-video
//! watch progress. All mutations are synchronous and atomic: subscribers
//! are notified only after a mutation has fully committed, and each
//! callback receives the complete state by value.
//!
//! Persistence goes through the [`KeyValueStore`] bridge (the browser's
//! localStorage on the web host). Failures to read or write never crash
//! the store; it degrades to in-memory state with a warning. A corrupt
//! snapshot is salvaged field by field over the defaults.

use crate::models::{MediaItem, PlaybackState, RepeatMode, WatchProgress};
use bridge_traits::KeyValueStore;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

const PLAYBACK_STATE_KEY: &str = "streamcore.playback_state";
const WATCH_PROGRESS_KEY: &str = "streamcore.watch_progress";

/// Restart-vs-go-back threshold for `previous()`, in seconds.
const RESTART_THRESHOLD_SECONDS: f64 = 3.0;

/// Fraction of the duration at which a video counts as watched.
const COMPLETION_RATIO: f64 = 0.95;

/// Handle returned by [`PlaybackStore::subscribe`]; pass it back to
/// [`PlaybackStore::unsubscribe`] to stop receiving notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&PlaybackState) + Send + Sync>;

/// Snapshot written to persistent storage. `is_playing` is intentionally
/// absent: transport state is never trusted across reloads.
#[derive(Serialize)]
struct Snapshot<'a> {
    current_track_id: &'a Option<String>,
    current_track: &'a Option<MediaItem>,
    position_seconds: f64,
    queue: &'a [MediaItem],
    queue_index: isize,
    shuffle: bool,
    repeat: RepeatMode,
    volume: f32,
}

struct Inner {
    state: PlaybackState,
    /// Pre-shuffle ordering, maintained in parallel with `state.queue` so
    /// disabling shuffle can restore it.
    original_queue: Vec<MediaItem>,
    watch_progress: HashMap<String, WatchProgress>,
}

/// The playback state store. Construct one per application session and
/// share it via `Arc`.
pub struct PlaybackStore {
    kv: Arc<dyn KeyValueStore>,
    inner: Mutex<Inner>,
    subscribers: Mutex<Vec<(u64, Subscriber)>>,
    next_subscriber_id: AtomicU64,
}

impl PlaybackStore {
    /// Create a store, restoring any persisted snapshot. `is_playing`
    /// always restores as `false`.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        let state = load_state(kv.as_ref());
        let watch_progress = load_watch_progress(kv.as_ref());
        let original_queue = state.queue.clone();

        Self {
            kv,
            inner: Mutex::new(Inner {
                state,
                original_queue,
                watch_progress,
            }),
            subscribers: Mutex::new(Vec::new()),
            next_subscriber_id: AtomicU64::new(1),
        }
    }

    // ========================================================================
    // Subscription
    // ========================================================================

    /// Register a callback invoked synchronously after every committed
    /// mutation, with the full state by value.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PlaybackState) + Send + Sync + 'static,
    {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push((id, Arc::new(callback)));
        SubscriptionId(id)
    }

    /// Remove a previously registered callback.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.lock().retain(|(sid, _)| *sid != id.0);
    }

    fn notify(&self, state: &PlaybackState) {
        let callbacks: Vec<Subscriber> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(state);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Current state by value.
    pub fn state(&self) -> PlaybackState {
        self.inner.lock().state.clone()
    }

    /// Watch progress for a single item.
    pub fn watch_progress(&self, media_id: &str) -> Option<WatchProgress> {
        self.inner.lock().watch_progress.get(media_id).cloned()
    }

    /// Incomplete items with a saved position, most recently updated first.
    pub fn continue_watching(&self) -> Vec<WatchProgress> {
        let inner = self.inner.lock();
        let mut entries: Vec<WatchProgress> = inner
            .watch_progress
            .values()
            .filter(|p| !p.completed && p.position_seconds > 0.0)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        entries
    }

    // ========================================================================
    // Transport operations
    // ========================================================================

    /// Start playing `track`, establishing a new queue.
    ///
    /// With `all_items`, the queue becomes those items (shuffled behind the
    /// track when shuffle is on). Without, the track is located in — or
    /// appended to — the existing queue.
    pub fn play(&self, track: &MediaItem, all_items: Option<&[MediaItem]>) {
        let state = {
            let mut inner = self.inner.lock();

            match all_items {
                Some(items) if !items.is_empty() => {
                    inner.original_queue = items.to_vec();
                    if inner.state.shuffle {
                        let mut rest: Vec<MediaItem> = items
                            .iter()
                            .filter(|item| item.id != track.id)
                            .cloned()
                            .collect();
                        shuffle_in_place(&mut rest);
                        let mut queue = Vec::with_capacity(items.len());
                        queue.push(track.clone());
                        queue.extend(rest);
                        inner.state.queue = queue;
                        inner.state.queue_index = 0;
                    } else {
                        let index = items.iter().position(|item| item.id == track.id);
                        inner.state.queue = items.to_vec();
                        inner.state.queue_index = index.unwrap_or(0) as isize;
                    }
                }
                _ if inner.state.queue.is_empty() => {
                    inner.state.queue = vec![track.clone()];
                    inner.state.queue_index = 0;
                    inner.original_queue = vec![track.clone()];
                }
                _ => {
                    if let Some(index) =
                        inner.state.queue.iter().position(|item| item.id == track.id)
                    {
                        inner.state.queue_index = index as isize;
                    } else {
                        inner.state.queue.push(track.clone());
                        inner.state.queue_index = inner.state.queue.len() as isize - 1;
                        inner.original_queue.push(track.clone());
                    }
                }
            }

            inner.state.current_track = Some(track.clone());
            inner.state.current_track_id = Some(track.id.clone());
            inner.state.position_seconds = 0.0;
            inner.state.is_playing = true;

            self.persist_state(&inner);
            inner.state.clone()
        };
        self.notify(&state);
    }

    /// Pause playback. Persists, so the position survives a reload.
    pub fn pause(&self) {
        let state = {
            let mut inner = self.inner.lock();
            inner.state.is_playing = false;
            self.persist_state(&inner);
            inner.state.clone()
        };
        self.notify(&state);
    }

    /// Resume playback. Only effective while a current track exists.
    pub fn resume(&self) {
        let state = {
            let mut inner = self.inner.lock();
            if inner.state.current_track.is_none() {
                return;
            }
            inner.state.is_playing = true;
            inner.state.clone()
        };
        self.notify(&state);
    }

    /// Convenience toggle between [`Self::pause`] and [`Self::resume`].
    pub fn toggle_play_pause(&self) {
        let playing = self.inner.lock().state.is_playing;
        if playing {
            self.pause();
        } else {
            self.resume();
        }
    }

    /// Advance to the next track.
    ///
    /// Resolution order: repeat-one replays the current index; otherwise
    /// advance by one; at the end of the queue, repeat-all wraps to the
    /// start, and repeat-off stops playback and returns `None` with the
    /// queue untouched.
    pub fn next(&self) -> Option<MediaItem> {
        let (state, track) = {
            let mut inner = self.inner.lock();
            if inner.state.queue.is_empty() {
                return None;
            }

            let last = inner.state.queue.len() as isize - 1;
            let next_index = if inner.state.repeat == RepeatMode::One {
                inner.state.queue_index
            } else if inner.state.queue_index < last {
                inner.state.queue_index + 1
            } else if inner.state.repeat == RepeatMode::All {
                0
            } else {
                // End of a non-repeating queue: stop, no track change.
                inner.state.is_playing = false;
                let state = inner.state.clone();
                drop(inner);
                self.notify(&state);
                return None;
            };

            let track = inner.state.queue[next_index as usize].clone();
            inner.state.queue_index = next_index;
            inner.state.current_track = Some(track.clone());
            inner.state.current_track_id = Some(track.id.clone());
            inner.state.position_seconds = 0.0;
            inner.state.is_playing = true;

            self.persist_state(&inner);
            (inner.state.clone(), track)
        };
        self.notify(&state);
        Some(track)
    }

    /// Go back one track, or restart the current one when more than three
    /// seconds in. Never returns `None` once a track exists.
    pub fn previous(&self) -> Option<MediaItem> {
        let (state, track) = {
            let mut inner = self.inner.lock();
            if inner.state.queue.is_empty() {
                return None;
            }

            if inner.state.position_seconds > RESTART_THRESHOLD_SECONDS {
                inner.state.position_seconds = 0.0;
                self.persist_state(&inner);
                let state = inner.state.clone();
                let track = inner.state.current_track.clone();
                drop(inner);
                self.notify(&state);
                return track;
            }

            let prev_index = if inner.state.queue_index > 0 {
                inner.state.queue_index - 1
            } else if inner.state.repeat == RepeatMode::All {
                inner.state.queue.len() as isize - 1
            } else {
                // Already at the start: stay, position reset.
                inner.state.position_seconds = 0.0;
                self.persist_state(&inner);
                let state = inner.state.clone();
                let track = inner.state.current_track.clone();
                drop(inner);
                self.notify(&state);
                return track;
            };

            let track = inner.state.queue[prev_index as usize].clone();
            inner.state.queue_index = prev_index;
            inner.state.current_track = Some(track.clone());
            inner.state.current_track_id = Some(track.id.clone());
            inner.state.position_seconds = 0.0;
            inner.state.is_playing = true;

            self.persist_state(&inner);
            (inner.state.clone(), track)
        };
        self.notify(&state);
        Some(track)
    }

    /// Toggle shuffle. Enabling keeps the current track at the new index 0
    /// and shuffles the rest; disabling restores the tracked original
    /// ordering and relocates the index to the current track (default 0).
    pub fn toggle_shuffle(&self) {
        let state = {
            let mut inner = self.inner.lock();
            inner.state.shuffle = !inner.state.shuffle;

            if inner.state.shuffle {
                if let Some(index) = inner.state.current_index() {
                    let current = inner.state.queue[index].clone();
                    let mut rest: Vec<MediaItem> = inner.state.queue[..index]
                        .iter()
                        .chain(inner.state.queue[index + 1..].iter())
                        .cloned()
                        .collect();
                    shuffle_in_place(&mut rest);
                    let mut queue = Vec::with_capacity(inner.state.queue.len());
                    queue.push(current);
                    queue.extend(rest);
                    inner.state.queue = queue;
                    inner.state.queue_index = 0;
                }
            } else if !inner.original_queue.is_empty() {
                let current_id = inner.state.current_track_id.clone();
                let index = current_id
                    .and_then(|id| inner.original_queue.iter().position(|item| item.id == id))
                    .unwrap_or(0);
                inner.state.queue = inner.original_queue.clone();
                inner.state.queue_index = index as isize;
            }

            self.persist_state(&inner);
            inner.state.clone()
        };
        self.notify(&state);
    }

    /// Cycle repeat mode: off -> all -> one -> off.
    pub fn cycle_repeat(&self) {
        let state = {
            let mut inner = self.inner.lock();
            inner.state.repeat = inner.state.repeat.cycled();
            self.persist_state(&inner);
            inner.state.clone()
        };
        self.notify(&state);
    }

    /// Set volume, clamped to `[0.0, 1.0]`.
    pub fn set_volume(&self, volume: f32) {
        let state = {
            let mut inner = self.inner.lock();
            inner.state.volume = volume.clamp(0.0, 1.0);
            self.persist_state(&inner);
            inner.state.clone()
        };
        self.notify(&state);
    }

    /// High-frequency position tick: updates the in-memory value only.
    /// Persistence is batched through [`Self::save_position`] to avoid
    /// write amplification.
    pub fn update_position(&self, seconds: f64) {
        self.inner.lock().state.position_seconds = seconds;
    }

    /// Force a persistence write of the current snapshot. Intended to be
    /// driven on a fixed interval and on pause/close.
    pub fn save_position(&self) {
        let inner = self.inner.lock();
        self.persist_state(&inner);
    }

    /// User-initiated seek: set position and persist immediately.
    pub fn seek(&self, seconds: f64) {
        let state = {
            let mut inner = self.inner.lock();
            inner.state.position_seconds = seconds;
            self.persist_state(&inner);
            inner.state.clone()
        };
        self.notify(&state);
    }

    // ========================================================================
    // Queue editing
    // ========================================================================

    /// Append an item to the end of the queue.
    pub fn add_to_queue(&self, item: &MediaItem) {
        let state = {
            let mut inner = self.inner.lock();
            inner.state.queue.push(item.clone());
            inner.original_queue.push(item.clone());
            self.persist_state(&inner);
            inner.state.clone()
        };
        self.notify(&state);
    }

    /// Insert an item immediately after the current index.
    pub fn play_next(&self, item: &MediaItem) {
        let state = {
            let mut inner = self.inner.lock();
            let insert_at =
                ((inner.state.queue_index + 1).max(0) as usize).min(inner.state.queue.len());
            inner.state.queue.insert(insert_at, item.clone());
            let original_at = insert_at.min(inner.original_queue.len());
            inner.original_queue.insert(original_at, item.clone());
            self.persist_state(&inner);
            inner.state.clone()
        };
        self.notify(&state);
    }

    /// Remove the item at `index`, adjusting the queue pointer. Removing
    /// the current track moves to the nearest remaining item, or clears
    /// the current track if the queue becomes empty.
    pub fn remove_from_queue(&self, index: usize) {
        let state = {
            let mut inner = self.inner.lock();
            if index >= inner.state.queue.len() {
                return;
            }

            let removed = inner.state.queue.remove(index);
            if let Some(pos) = inner
                .original_queue
                .iter()
                .position(|item| item.id == removed.id)
            {
                inner.original_queue.remove(pos);
            }

            let current = inner.state.queue_index;
            if (index as isize) < current {
                inner.state.queue_index = current - 1;
            } else if index as isize == current {
                if !inner.state.queue.is_empty() {
                    let new_index = (current as usize).min(inner.state.queue.len() - 1);
                    let track = inner.state.queue[new_index].clone();
                    inner.state.queue_index = new_index as isize;
                    inner.state.current_track_id = Some(track.id.clone());
                    inner.state.current_track = Some(track);
                } else {
                    inner.state.current_track = None;
                    inner.state.current_track_id = None;
                    inner.state.queue_index = -1;
                }
            }

            self.persist_state(&inner);
            inner.state.clone()
        };
        self.notify(&state);
    }

    /// Drop the whole queue and stop playback.
    pub fn clear_queue(&self) {
        let state = {
            let mut inner = self.inner.lock();
            inner.state.queue.clear();
            inner.original_queue.clear();
            inner.state.queue_index = -1;
            inner.state.current_track = None;
            inner.state.current_track_id = None;
            inner.state.is_playing = false;
            inner.state.position_seconds = 0.0;
            self.persist_state(&inner);
            inner.state.clone()
        };
        self.notify(&state);
    }

    /// Stop playback and clear the current track. The queue survives.
    pub fn close(&self) {
        let state = {
            let mut inner = self.inner.lock();
            inner.state.is_playing = false;
            inner.state.current_track = None;
            inner.state.current_track_id = None;
            self.persist_state(&inner);
            inner.state.clone()
        };
        self.notify(&state);
    }

    // ========================================================================
    // Watch progress
    // ========================================================================

    /// Record the playhead for a video. At >= 95% of the duration the item
    /// is marked completed and the stored position resets to 0.
    pub fn update_watch_progress(&self, media_id: &str, position_seconds: f64, duration: f64) {
        let mut inner = self.inner.lock();
        let completed = duration > 0.0 && position_seconds / duration >= COMPLETION_RATIO;
        inner.watch_progress.insert(
            media_id.to_string(),
            WatchProgress {
                media_id: media_id.to_string(),
                position_seconds: if completed { 0.0 } else { position_seconds },
                completed,
                updated_at: chrono::Utc::now().timestamp_millis(),
            },
        );
        self.persist_watch_progress(&inner);
    }

    /// Forget the saved progress for one item.
    pub fn clear_watch_progress(&self, media_id: &str) {
        let mut inner = self.inner.lock();
        inner.watch_progress.remove(media_id);
        self.persist_watch_progress(&inner);
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    fn persist_state(&self, inner: &Inner) {
        let snapshot = Snapshot {
            current_track_id: &inner.state.current_track_id,
            current_track: &inner.state.current_track,
            position_seconds: inner.state.position_seconds,
            queue: &inner.state.queue,
            queue_index: inner.state.queue_index,
            shuffle: inner.state.shuffle,
            repeat: inner.state.repeat,
            volume: inner.state.volume,
        };
        match serde_json::to_string(&snapshot) {
            Ok(json) => {
                if let Err(e) = self.kv.set_item(PLAYBACK_STATE_KEY, &json) {
                    warn!(error = %e, "Failed to save playback state");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize playback state"),
        }
    }

    fn persist_watch_progress(&self, inner: &Inner) {
        match serde_json::to_string(&inner.watch_progress) {
            Ok(json) => {
                if let Err(e) = self.kv.set_item(WATCH_PROGRESS_KEY, &json) {
                    warn!(error = %e, "Failed to save watch progress");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize watch progress"),
        }
    }
}

// ============================================================================
// Snapshot loading
// ============================================================================

fn load_state(kv: &dyn KeyValueStore) -> PlaybackState {
    let mut state = PlaybackState::default();

    let raw = match kv.get_item(PLAYBACK_STATE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return state,
        Err(e) => {
            warn!(error = %e, "Failed to load playback state");
            return state;
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Playback state snapshot unreadable, using defaults");
            return state;
        }
    };

    // Merge whatever fields parse over the defaults; a single bad field
    // must not discard the rest of the snapshot.
    merge_field(&value, "current_track_id", &mut state.current_track_id);
    merge_field(&value, "current_track", &mut state.current_track);
    merge_field(&value, "position_seconds", &mut state.position_seconds);
    merge_field(&value, "queue", &mut state.queue);
    merge_field(&value, "queue_index", &mut state.queue_index);
    merge_field(&value, "shuffle", &mut state.shuffle);
    merge_field(&value, "repeat", &mut state.repeat);
    merge_field(&value, "volume", &mut state.volume);

    sanitize(&mut state);
    debug!(
        queue_len = state.queue.len(),
        queue_index = state.queue_index,
        "Restored playback state"
    );
    state
}

fn merge_field<T: DeserializeOwned>(value: &serde_json::Value, key: &str, slot: &mut T) {
    if let Some(field) = value.get(key) {
        if let Ok(parsed) = serde_json::from_value::<T>(field.clone()) {
            *slot = parsed;
        }
    }
}

/// Re-establish the queue invariants after restoring an arbitrary snapshot.
fn sanitize(state: &mut PlaybackState) {
    if state.queue.is_empty() {
        state.queue_index = -1;
    } else {
        state.queue_index = state.queue_index.clamp(0, state.queue.len() as isize - 1);
    }
    state.volume = state.volume.clamp(0.0, 1.0);
    state.is_playing = false;
}

fn load_watch_progress(kv: &dyn KeyValueStore) -> HashMap<String, WatchProgress> {
    match kv.get_item(WATCH_PROGRESS_KEY) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "Watch progress unreadable, starting empty");
                HashMap::new()
            }
        },
        Ok(None) => HashMap::new(),
        Err(e) => {
            warn!(error = %e, "Failed to load watch progress");
            HashMap::new()
        }
    }
}

fn shuffle_in_place(items: &mut [MediaItem]) {
    let mut rng = rand::rng();
    items.shuffle(&mut rng);
}

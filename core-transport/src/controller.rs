//! # Transport Controller
//!
//! Mediator between the playback state store, the binary object cache,
//! the remote blob collaborator, and the decode/render engine. Owns byte
//! resolution, transport state transitions, stale-response guarding, and
//! the periodic persistence cadence.

use crate::error::{Result, TransportError};
use crate::mime::mime_for_url;
use crate::state::TransportState;
use bridge_traits::{BlobClient, MediaEngine, MediaSource};
use bytes::Bytes;
use core_cache::MediaCache;
use core_runtime::config::{DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_MEDIA_BUCKET};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use core_state::{MediaItem, MediaKind, PlaybackStore};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Wall-clock interval between position persistence writes.
pub const PERSIST_INTERVAL: Duration = Duration::from_secs(5);

/// Collaborator and policy knobs for the controller.
#[derive(Clone)]
pub struct TransportConfig {
    pub blob_client: Option<Arc<dyn BlobClient>>,
    /// Bucket media payloads are downloaded from.
    pub media_bucket: String,
    /// Timeout for a single remote download.
    pub download_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            blob_client: None,
            media_bucket: DEFAULT_MEDIA_BUCKET.to_string(),
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Extract the transport's slice of an assembled [`CoreConfig`].
    pub fn from_core(config: &core_runtime::CoreConfig) -> Self {
        Self {
            blob_client: config.blob_client.clone(),
            media_bucket: config.media_bucket.clone(),
            download_timeout: config.download_timeout,
        }
    }
}

struct Runtime {
    state: TransportState,
    current: Option<MediaItem>,
    last_persist: Option<Instant>,
}

/// Drives one playback surface. Hosts forward the engine's time-update,
/// ended, and error callbacks into [`on_time_update`](Self::on_time_update),
/// [`on_ended`](Self::on_ended), and [`on_engine_error`](Self::on_engine_error).
pub struct TransportController {
    store: Arc<PlaybackStore>,
    engine: Arc<dyn MediaEngine>,
    cache: Arc<MediaCache>,
    config: TransportConfig,
    events: Option<EventBus>,
    /// Bumped by every `load`; a resolution finishing under an older value
    /// is stale and must be discarded.
    generation: AtomicU64,
    runtime: Mutex<Runtime>,
}

impl TransportController {
    pub fn new(
        store: Arc<PlaybackStore>,
        engine: Arc<dyn MediaEngine>,
        cache: Arc<MediaCache>,
        config: TransportConfig,
    ) -> Self {
        Self {
            store,
            engine,
            cache,
            config,
            events: None,
            generation: AtomicU64::new(0),
            runtime: Mutex::new(Runtime {
                state: TransportState::Idle,
                current: None,
                last_persist: None,
            }),
        }
    }

    /// Attach an event bus; transport transitions are then published as
    /// [`PlaybackEvent`]s.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> TransportState {
        self.runtime.lock().state
    }

    /// Item currently assigned to the surface, if any.
    pub fn current_item(&self) -> Option<MediaItem> {
        self.runtime.lock().current.clone()
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.events {
            bus.emit(CoreEvent::Playback(event)).ok();
        }
    }

    fn transition(&self, next: TransportState) {
        let mut runtime = self.runtime.lock();
        if !runtime.state.can_transition_to(next) {
            warn!(from = ?runtime.state, to = ?next, "Unexpected transport transition");
        }
        runtime.state = next;
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Establish a new queue in the store and start playing `item`.
    pub async fn play(&self, item: &MediaItem, all_items: Option<&[MediaItem]>) -> Result<()> {
        self.store.play(item, all_items);
        self.load(item).await
    }

    /// Resolve bytes for `item`, hand them to the engine, and start
    /// playback. A `load` racing an older in-flight resolution wins: the
    /// older resolution is discarded when it finishes.
    #[instrument(skip(self, item), fields(media_id = %item.id))]
    pub async fn load(&self, item: &MediaItem) -> Result<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut runtime = self.runtime.lock();
            runtime.state = TransportState::Loading;
            runtime.current = Some(item.clone());
            runtime.last_persist = None;
        }
        self.emit(PlaybackEvent::Loading {
            media_id: item.id.clone(),
        });

        if let Err(e) = self.engine.stop().await {
            warn!(error = %e, "Engine stop before load failed");
        }

        let resolved = self.resolve(item).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(media_id = %item.id, "Discarding stale byte resolution");
            return Ok(());
        }

        let source = match resolved {
            Ok(source) => source,
            Err(e) => {
                self.transition(TransportState::Error);
                self.emit(PlaybackEvent::Error {
                    media_id: Some(item.id.clone()),
                    message: e.to_string(),
                    recoverable: e.is_transient(),
                });
                return Err(e);
            }
        };

        self.engine
            .load(source)
            .await
            .map_err(TransportError::Engine)?;
        self.transition(TransportState::Ready);

        let volume = self.store.state().volume;
        if let Err(e) = self.engine.set_volume(volume).await {
            warn!(error = %e, "Failed to apply volume to engine");
        }

        self.engine.play().await.map_err(TransportError::Engine)?;
        self.transition(TransportState::Playing);
        self.emit(PlaybackEvent::Started {
            media_id: item.id.clone(),
            title: item.title.clone(),
        });
        Ok(())
    }

    /// Byte resolution, in priority order: absolute URL passthrough, object
    /// cache, remote blob download (which repopulates the cache off-path).
    async fn resolve(&self, item: &MediaItem) -> Result<MediaSource> {
        if item.url.starts_with("http://") || item.url.starts_with("https://") {
            debug!(media_id = %item.id, "Absolute URL, engine streams directly");
            return Ok(MediaSource::RemoteUrl {
                url: item.url.clone(),
            });
        }

        if let Some(cached) = self.cache.get(item.cache_key()).await {
            debug!(media_id = %item.id, size = cached.data.len(), "Serving from object cache");
            return Ok(MediaSource::Payload {
                data: cached.data,
                mime_type: cached.mime_type,
            });
        }

        let blob = self
            .config
            .blob_client
            .as_ref()
            .ok_or_else(|| TransportError::NoRemoteStorage {
                media_id: item.id.clone(),
            })?;

        let download = blob.download(&self.config.media_bucket, &item.url);
        let data = match tokio::time::timeout(self.config.download_timeout, download).await {
            Ok(Ok(data)) => data,
            Ok(Err(e)) => return Err(TransportError::Download(e)),
            Err(_) => {
                return Err(TransportError::DownloadTimeout {
                    path: item.url.clone(),
                    seconds: self.config.download_timeout.as_secs(),
                })
            }
        };

        if data.is_empty() {
            return Err(TransportError::EmptyPayload {
                path: item.url.clone(),
            });
        }

        let mime_type = mime_for_url(&item.url, item.kind);
        self.spawn_cache_populate(item, data.clone(), mime_type);

        Ok(MediaSource::Payload {
            data,
            mime_type: mime_type.to_string(),
        })
    }

    /// Cache population runs off the playback path; a failure only costs a
    /// future re-download.
    fn spawn_cache_populate(&self, item: &MediaItem, data: Bytes, mime_type: &'static str) {
        let cache = Arc::clone(&self.cache);
        let id = item.cache_key().to_string();
        let url = item.url.clone();
        tokio::spawn(async move {
            cache.set(&id, &url, data, mime_type).await;
        });
    }

    // ========================================================================
    // Transport surface
    // ========================================================================

    pub async fn pause(&self) -> Result<()> {
        self.engine.pause().await.map_err(TransportError::Engine)?;
        self.store.pause();
        self.transition(TransportState::Paused);
        let state = self.store.state();
        if let Some(id) = state.current_track_id {
            self.emit(PlaybackEvent::Paused {
                media_id: id,
                position_seconds: state.position_seconds,
            });
        }
        Ok(())
    }

    pub async fn resume(&self) -> Result<()> {
        self.engine.play().await.map_err(TransportError::Engine)?;
        self.store.resume();
        self.transition(TransportState::Playing);
        if let Some(id) = self.store.state().current_track_id {
            self.emit(PlaybackEvent::Resumed { media_id: id });
        }
        Ok(())
    }

    pub async fn toggle_play_pause(&self) -> Result<()> {
        if self.store.state().is_playing {
            self.pause().await
        } else {
            self.resume().await
        }
    }

    /// Skip to the next queue item, honoring the repeat mode.
    pub async fn next(&self) -> Result<()> {
        match self.store.next() {
            Some(track) => self.load(&track).await,
            None => {
                self.transition(TransportState::Ended);
                if let Err(e) = self.engine.pause().await {
                    warn!(error = %e, "Engine pause at end of queue failed");
                }
                Ok(())
            }
        }
    }

    /// Go back one item, or restart the current one past the threshold.
    pub async fn previous(&self) -> Result<()> {
        let before = self.store.state().current_track_id;
        match self.store.previous() {
            Some(track) => {
                if before.as_deref() == Some(track.id.as_str()) {
                    // Same item, position reset: a seek is enough.
                    self.engine
                        .seek(Duration::ZERO)
                        .await
                        .map_err(TransportError::Engine)
                } else {
                    self.load(&track).await
                }
            }
            None => Ok(()),
        }
    }

    pub async fn seek(&self, seconds: f64) -> Result<()> {
        self.engine
            .seek(Duration::from_secs_f64(seconds.max(0.0)))
            .await
            .map_err(TransportError::Engine)?;
        self.store.seek(seconds);
        Ok(())
    }

    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        let clamped = volume.clamp(0.0, 1.0);
        self.engine
            .set_volume(clamped)
            .await
            .map_err(TransportError::Engine)?;
        self.store.set_volume(clamped);
        Ok(())
    }

    // ========================================================================
    // Engine callbacks
    // ========================================================================

    /// Per-tick playhead report from the engine. Every tick updates the
    /// in-memory position; at most once per [`PERSIST_INTERVAL`] it also
    /// persists the snapshot and, for video, the watch progress.
    pub fn on_time_update(&self, seconds: f64) {
        self.on_time_update_at(seconds, Instant::now());
    }

    fn on_time_update_at(&self, seconds: f64, now: Instant) {
        self.store.update_position(seconds);

        let due = {
            let mut runtime = self.runtime.lock();
            let due = runtime
                .last_persist
                .map_or(true, |last| now.duration_since(last) >= PERSIST_INTERVAL);
            if due {
                runtime.last_persist = Some(now);
            }
            due
        };
        if !due {
            return;
        }

        self.store.save_position();
        if let Some(item) = self.current_item() {
            if item.kind == MediaKind::Video {
                self.store
                    .update_watch_progress(&item.id, seconds, item.duration_seconds);
            }
        }
    }

    /// The engine reached the end of the loaded source.
    pub async fn on_ended(&self) -> Result<()> {
        let finished = self.current_item();
        self.transition(TransportState::Ended);
        if let Some(item) = &finished {
            if item.kind == MediaKind::Video {
                self.store
                    .update_watch_progress(&item.id, item.duration_seconds, item.duration_seconds);
            }
            self.emit(PlaybackEvent::Completed {
                media_id: item.id.clone(),
            });
        }

        match self.store.next() {
            Some(track) => self.load(&track).await,
            None => Ok(()),
        }
    }

    /// The engine faulted mid-playback. Reported, then recovered the same
    /// way as a natural end of track.
    pub async fn on_engine_error(&self, message: &str) -> Result<()> {
        warn!(message, "Engine reported a playback fault");
        self.transition(TransportState::Error);
        self.emit(PlaybackEvent::Error {
            media_id: self.current_item().map(|i| i.id),
            message: message.to_string(),
            recoverable: true,
        });

        match self.store.next() {
            Some(track) => self.load(&track).await,
            None => Ok(()),
        }
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Stop the engine, record final progress, and return to `Idle`.
    #[instrument(skip(self))]
    pub async fn close(&self) -> Result<()> {
        let current = self.current_item();
        if let Some(item) = &current {
            if item.kind == MediaKind::Video {
                let position = self.store.state().position_seconds;
                self.store
                    .update_watch_progress(&item.id, position, item.duration_seconds);
            }
        }

        self.engine.stop().await.map_err(TransportError::Engine)?;
        self.store.close();

        {
            let mut runtime = self.runtime.lock();
            runtime.state = TransportState::Idle;
            runtime.current = None;
            runtime.last_persist = None;
        }
        if let Some(item) = current {
            self.emit(PlaybackEvent::Stopped { media_id: item.id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::MemoryKeyValueStore;
    use core_cache::CacheConfig;

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

    struct NoFs;

    #[async_trait]
    impl bridge_traits::FileSystemAccess for NoFs {
        async fn get_cache_directory(
            &self,
        ) -> bridge_traits::error::Result<std::path::PathBuf> {
            Err(bridge_traits::BridgeError::NotAvailable("test".to_string()))
        }
        async fn exists(&self, _: &std::path::Path) -> bridge_traits::error::Result<bool> {
            Err(bridge_traits::BridgeError::NotAvailable("test".to_string()))
        }
        async fn metadata(
            &self,
            _: &std::path::Path,
        ) -> bridge_traits::error::Result<bridge_traits::FileMetadata> {
            Err(bridge_traits::BridgeError::NotAvailable("test".to_string()))
        }
        async fn create_dir_all(&self, _: &std::path::Path) -> bridge_traits::error::Result<()> {
            Err(bridge_traits::BridgeError::NotAvailable("test".to_string()))
        }
        async fn read_file(&self, _: &std::path::Path) -> bridge_traits::error::Result<Bytes> {
            Err(bridge_traits::BridgeError::NotAvailable("test".to_string()))
        }
        async fn write_file(
            &self,
            _: &std::path::Path,
            _: Bytes,
        ) -> bridge_traits::error::Result<()> {
            Err(bridge_traits::BridgeError::NotAvailable("test".to_string()))
        }
        async fn delete_file(&self, _: &std::path::Path) -> bridge_traits::error::Result<()> {
            Err(bridge_traits::BridgeError::NotAvailable("test".to_string()))
        }
        async fn list_directory(
            &self,
            _: &std::path::Path,
        ) -> bridge_traits::error::Result<Vec<std::path::PathBuf>> {
            Err(bridge_traits::BridgeError::NotAvailable("test".to_string()))
        }
    }

    fn controller() -> TransportController {
        let store = Arc::new(PlaybackStore::new(Arc::new(MemoryKeyValueStore::new())));
        let cache = Arc::new(MediaCache::new(Arc::new(NoFs), CacheConfig::default()));
        TransportController::new(store, Arc::new(NoopEngine), cache, TransportConfig::default())
    }

    fn video(id: &str) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            title: "Clip".to_string(),
            artist: "Tester".to_string(),
            kind: MediaKind::Video,
            cover: None,
            url: format!("uploads/{}.mp4", id),
            duration_seconds: 100.0,
        }
    }

    #[test]
    fn persist_interval_is_five_seconds() {
        assert_eq!(PERSIST_INTERVAL, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn time_updates_persist_at_most_every_five_seconds() {
        let controller = controller();
        let item = video("v1");
        controller.store.play(&item, None);
        controller.runtime.lock().current = Some(item.clone());

        let start = Instant::now();
        controller.on_time_update_at(1.0, start);
        let first = controller.store.watch_progress("v1");
        assert!(first.is_some(), "first tick persists immediately");

        // Ticks inside the interval update memory only.
        controller.on_time_update_at(2.0, start + Duration::from_secs(2));
        assert_eq!(
            controller.store.watch_progress("v1").unwrap().position_seconds,
            1.0
        );
        assert_eq!(controller.store.state().position_seconds, 2.0);

        // Past the interval the progress catches up.
        controller.on_time_update_at(6.5, start + Duration::from_secs(6));
        assert_eq!(
            controller.store.watch_progress("v1").unwrap().position_seconds,
            6.5
        );
    }

    #[tokio::test]
    async fn audio_ticks_do_not_record_watch_progress() {
        let controller = controller();
        let mut item = video("a1");
        item.kind = MediaKind::Audio;
        controller.store.play(&item, None);
        controller.runtime.lock().current = Some(item);

        controller.on_time_update_at(3.0, Instant::now());
        assert!(controller.store.watch_progress("a1").is_none());
    }
}

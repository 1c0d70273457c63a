//! # Event Bus System
//!
//! Cross-module event broadcasting for the playback core, built on
//! `tokio::sync::broadcast`. The playback state store has its own
//! synchronous subscriber list for full-state UI fan-out; this bus carries
//! the coarser typed notifications (transport transitions, cache activity,
//! library changes) that hosts and diagnostics consume.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, PlaybackEvent};
//!
//! let bus = EventBus::new(100);
//! let mut sub = bus.subscribe();
//!
//! bus.emit(CoreEvent::Playback(PlaybackEvent::Started {
//!     media_id: "m-1".to_string(),
//!     title: "Intro".to_string(),
//! })).ok();
//! ```
//!
//! Subscribers that fall behind receive `RecvError::Lagged` and can keep
//! consuming; `RecvError::Closed` signals shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Transport/playback-related events
    Playback(PlaybackEvent),
    /// Object-cache-related events
    Cache(CacheEvent),
    /// Library/catalog-related events
    Library(LibraryEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Cache(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Cache(CacheEvent::Disabled { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::Started { .. }) => EventSeverity::Info,
            CoreEvent::Library(LibraryEvent::ItemAdded { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events emitted by the transport controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// Byte resolution started for a newly assigned item.
    Loading { media_id: String },
    /// Playback started.
    Started { media_id: String, title: String },
    /// Playback paused.
    Paused { media_id: String, position_seconds: f64 },
    /// Playback resumed after pause.
    Resumed { media_id: String },
    /// Playback stopped (close or teardown).
    Stopped { media_id: String },
    /// Item finished playing naturally.
    Completed { media_id: String },
    /// Byte resolution or engine fault. Surfaced to the UI as transient.
    Error {
        media_id: Option<String>,
        message: String,
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Loading { .. } => "Resolving media bytes",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Resumed { .. } => "Playback resumed",
            PlaybackEvent::Stopped { .. } => "Playback stopped",
            PlaybackEvent::Completed { .. } => "Item completed",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Cache Events
// ============================================================================

/// Events emitted by the binary object cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    /// Entry served from the cache.
    Hit { id: String, size: u64 },
    /// Entry not present (or corrupt and dropped).
    Miss { id: String },
    /// Entry stored after a download.
    Stored { id: String, size: u64 },
    /// Entries evicted to stay under the size budget.
    Evicted { count: usize, bytes_freed: u64 },
    /// Cache backend failed and the cache degraded to no-op mode.
    Disabled { reason: String },
    /// All entries dropped.
    Cleared,
}

impl CacheEvent {
    fn description(&self) -> &str {
        match self {
            CacheEvent::Hit { .. } => "Cache hit",
            CacheEvent::Miss { .. } => "Cache miss",
            CacheEvent::Stored { .. } => "Media cached",
            CacheEvent::Evicted { .. } => "Cache entries evicted",
            CacheEvent::Disabled { .. } => "Cache disabled",
            CacheEvent::Cleared => "Cache cleared",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Events emitted by the media catalog and favorites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// New media item ingested into the catalog.
    ItemAdded { media_id: String, title: String },
    /// Media item removed from the catalog.
    ItemDeleted { media_id: String },
    /// Item marked as favorite.
    FavoriteAdded { media_id: String },
    /// Item unmarked as favorite.
    FavoriteRemoved { media_id: String },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::ItemAdded { .. } => "Media item added",
            LibraryEvent::ItemDeleted { .. } => "Media item deleted",
            LibraryEvent::FavoriteAdded { .. } => "Favorite added",
            LibraryEvent::FavoriteRemoved { .. } => "Favorite removed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Wraps `tokio::sync::broadcast`: multiple producers (clone the bus),
/// multiple independent consumers, non-blocking sends, lagging detection.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

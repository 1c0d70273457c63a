//! # Core State
//!
//! The playback state store: the single authoritative source for the
//! queue, transport flags, and per-video watch progress. All mutations
//! are synchronous and atomic; collaborators observe committed state
//! through subscriptions, never partial updates.

pub mod models;
pub mod store;

pub use models::{MediaItem, MediaKind, PlaybackState, RepeatMode, WatchProgress};
pub use store::{PlaybackStore, SubscriptionId};

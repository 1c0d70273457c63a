//! # Core Transport
//!
//! The transport controller: mediates between the playback state store,
//! the binary object cache, the remote blob collaborator, and the
//! platform media engine. Resolves media bytes (absolute URL, cache,
//! download), guards against stale resolutions with a generation
//! counter, and drives the persistence cadence from engine ticks.

pub mod controller;
pub mod error;
pub mod mime;
pub mod state;

pub use controller::{TransportConfig, TransportController, PERSIST_INTERVAL};
pub use error::{Result, TransportError};
pub use mime::mime_for_url;
pub use state::TransportState;

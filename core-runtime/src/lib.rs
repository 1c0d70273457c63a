//! # Core Runtime
//!
//! Ambient infrastructure for the Streamcore playback core:
//!
//! - [`config`] — startup dependency assembly with fail-fast validation
//! - [`events`] — typed broadcast event bus
//! - [`logging`] — `tracing` subscriber bootstrap
//! - [`error`] — runtime error type

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use events::{CacheEvent, CoreEvent, EventBus, LibraryEvent, PlaybackEvent};
pub use logging::{init_logging, LogFormat, LoggingConfig};

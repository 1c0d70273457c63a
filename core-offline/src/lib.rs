//! # Core Offline
//!
//! The offline layer's decision logic: a pure classifier mapping network
//! requests to fetch strategies, and the control messages the application
//! exchanges with the host's network interceptor. Interceptor lifecycle
//! (registration, activation, cache storage) belongs to the host.

pub mod control;
pub mod strategy;

pub use control::{CacheControlAck, CacheControlMessage};
pub use strategy::{
    FetchRequest, FetchStrategy, RequestClassifier, RequestDestination, SHELL_ROUTE,
};

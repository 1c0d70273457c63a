use thiserror::Error;

/// Errors raised by the runtime layer (configuration, logging bootstrap).
#[derive(Error, Debug)]
pub enum Error {
    /// A required bridge was not provided to the configuration builder.
    #[error("Missing required capability: {0}. Provide it on CoreConfigBuilder before build().")]
    MissingCapability(&'static str),

    /// A configuration value failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Logging infrastructure could not be initialized.
    #[error("Logging initialization failed: {0}")]
    Logging(String),

    /// Error surfaced from a bridge implementation.
    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),
}

pub type Result<T> = std::result::Result<T, Error>;

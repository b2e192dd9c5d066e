//! Error types for the staffrank node.

use thiserror::Error;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while starting or running the node.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed setting
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rank policy rejected
    #[error("Policy error: {0}")]
    Policy(#[from] staffrank_core::Error),

    /// Platform API call failed
    #[error("Platform error: {0}")]
    Platform(#[from] staffrank_core::PlatformError),

    /// Interaction signature rejected
    #[error("Signature error: {0}")]
    Signature(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Error types for the SIP creator worker

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for worker operations
pub type Result<T> = std::result::Result<T, WorkerError>;

#[derive(Error, Debug)]
pub enum WorkerError {
    /// Settings missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The watchfolder message cannot be turned into a delivery
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// An event could not be published
    #[error("Failed to publish event: {0}")]
    Publish(String),

    /// A message could not be acknowledged or rejected
    #[error("Delivery of '{}' failed: {source}", .path.display())]
    Delivery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker pool no longer accepts runs
    #[error("Worker pool is closed")]
    PoolClosed,

    #[error(transparent)]
    Sip(#[from] sipin_core::SipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for WorkerError {
    fn from(err: config::ConfigError) -> Self {
        WorkerError::Config(err.to_string())
    }
}

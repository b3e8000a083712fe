//! Engine error types.
//!
//! None of these reach producers: `track` and the lifecycle entry points
//! log and absorb them. They exist so transports, storage and tests can
//! tell failures apart.

use thiserror::Error;

/// Result type for engine operations.
pub type BeaconResult<T> = Result<T, BeaconError>;

/// Errors that can occur while persisting or delivering telemetry.
#[derive(Debug, Error)]
pub enum BeaconError {
    #[error("collector rejected batch with status {status}")]
    Rejected { status: u16 },

    #[error("collector unreachable: {0}")]
    Unreachable(String),

    #[error("storage error: {0}")]
    Storage(#[from] beacon_storage::StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("engine not running")]
    EngineStopped,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BeaconError {
    /// Returns true if the collector answered with a non-success status.
    pub fn is_rejection(&self) -> bool {
        matches!(self, BeaconError::Rejected { .. })
    }
}

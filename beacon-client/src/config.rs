//! Engine configuration.

use crate::error::{BeaconError, BeaconResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Storage keys for the three persisted records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageKeys {
    pub visitor: String,
    pub session: String,
    pub offline_queue: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            visitor: "beacon_uid".to_string(),
            session: "beacon_session".to_string(),
            offline_queue: "beacon_offline_queue".to_string(),
        }
    }
}

/// Configuration for the telemetry engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    /// Collector endpoint receiving batch POSTs (e.g., "https://collect.example.com/track").
    pub collector_url: String,

    /// Site identifier stamped on every event and envelope.
    pub site_id: String,

    /// Maximum events per delivery attempt.
    pub batch_size: usize,

    /// Dispatch timer period (milliseconds).
    pub dispatch_interval_ms: u64,

    /// Heartbeat timer period (milliseconds).
    pub heartbeat_interval_ms: u64,

    /// Inactivity after which a session expires (milliseconds).
    pub session_timeout_ms: i64,

    /// Maximum number of events kept in the offline queue.
    pub queue_capacity: usize,

    /// HTTP request timeout for delivery (seconds).
    pub request_timeout_secs: u64,

    /// Minimum spacing between session writes caused by raw activity signals.
    pub activity_debounce_ms: i64,

    pub storage_keys: StorageKeys,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            collector_url: "http://localhost:8000/track".to_string(),
            site_id: "localhost".to_string(),
            batch_size: 20,
            dispatch_interval_ms: 2_000,
            heartbeat_interval_ms: 15_000,
            session_timeout_ms: 30 * 60 * 1_000,
            queue_capacity: 2_000,
            request_timeout_secs: 10,
            activity_debounce_ms: 0,
            storage_keys: StorageKeys::default(),
        }
    }
}

impl BeaconConfig {
    /// Creates a config for the given collector and site with default tuning.
    pub fn new(collector_url: impl Into<String>, site_id: impl Into<String>) -> Self {
        Self {
            collector_url: collector_url.into(),
            site_id: site_id.into(),
            ..Self::default()
        }
    }

    /// Rejects settings that would stall or break the pipeline.
    pub fn validate(&self) -> BeaconResult<()> {
        if self.collector_url.trim().is_empty() {
            return Err(BeaconError::Config("collector_url must not be empty".into()));
        }
        if self.batch_size == 0 {
            return Err(BeaconError::Config("batch_size must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(BeaconError::Config("queue_capacity must be at least 1".into()));
        }
        if self.dispatch_interval_ms == 0 || self.heartbeat_interval_ms == 0 {
            return Err(BeaconError::Config("timer intervals must be non-zero".into()));
        }
        if self.session_timeout_ms <= 0 {
            return Err(BeaconError::Config("session_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_millis(self.dispatch_interval_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

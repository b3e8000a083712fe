//! Shared types for the delivery pipeline.

use beacon_types::{Event, SessionId, VisitorId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request body of one delivery attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchEnvelope {
    pub site_id: String,
    pub uid: VisitorId,
    pub session_id: SessionId,
    pub events: Vec<Event>,
}

impl BatchEnvelope {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Result of a single dispatch cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Known offline: the buffer was moved into the durable queue.
    Offline { queued: usize },
    /// Nothing to send.
    Idle,
    /// Another dispatch was still in flight; nothing was touched.
    InFlight,
    /// The collector accepted the batch.
    Delivered { events: usize, from_durable: usize },
    /// Delivery failed; the whole batch went back to the front of the durable queue.
    Requeued { events: usize },
}

/// Why the host is leaving or hiding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitReason {
    Hidden,
    Unload,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Hidden => write!(f, "hidden"),
            ExitReason::Unload => write!(f, "unload"),
        }
    }
}

/// Lifecycle signals delivered to the engine runner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineCommand {
    /// Host became hidden (tab backgrounded).
    PageHidden,
    /// Host is unloading; flush and stop.
    Unload,
    /// Network reachability changed.
    Reachability(bool),
    /// Run a dispatch cycle now.
    Flush,
    /// Flush and stop the runner.
    Stop,
}

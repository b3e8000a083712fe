//! Seam between host-specific event producers and the engine.
//!
//! Producers (click, scroll, form observers) know about the host page; the
//! engine only ever sees `(event_type, payload)` pairs and activity signals.

use crate::activity::ActivitySignal;
use serde_json::Value;
use std::sync::Arc;

/// Where producers send what they observe.
pub trait EventSink: Send + Sync {
    /// Tracks an event. Must never fail or panic.
    fn track(&self, event_type: &str, payload: Value);

    /// Reports a raw liveness signal that extends the session.
    fn record_activity(&self, signal: ActivitySignal);
}

/// A source of events wired to the engine at startup.
pub trait Producer: Send {
    fn name(&self) -> &str;

    /// Hands the producer its sink. Called once.
    fn attach(&mut self, sink: Arc<dyn EventSink>);
}

//! Shared test helpers: a scriptable in-memory collector and engine builders.

#![allow(dead_code)]

use async_trait::async_trait;
use beacon_client::{
    BatchEnvelope, BeaconConfig, BeaconError, BeaconResult, CollectorTransport, TelemetryEngine,
};
use beacon_storage::{KeyValueStore, MemoryStore};
use beacon_types::{Event, EventId, SessionId, SessionRecord, VisitorId, now_ms};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const SESSION_KEY: &str = "beacon_session";
pub const QUEUE_KEY: &str = "beacon_offline_queue";
pub const VISITOR_KEY: &str = "beacon_uid";

// ── Mock collector ──────────────────────────────────────────────

/// Records every delivery attempt; fails on demand.
#[derive(Default)]
pub struct RecordingTransport {
    attempts: Mutex<Vec<BatchEnvelope>>,
    delivered: Mutex<Vec<BatchEnvelope>>,
    /// Statuses to fail the next attempts with, in order.
    scripted_failures: Mutex<VecDeque<u16>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fails the next attempt with `status`.
    pub fn fail_next(&self, status: u16) {
        self.scripted_failures.lock().unwrap().push_back(status);
    }

    /// Makes every attempt fail as unreachable until switched off.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> Vec<BatchEnvelope> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn delivered(&self) -> Vec<BatchEnvelope> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    /// Event types of every delivered event, in delivery order.
    pub fn delivered_types(&self) -> Vec<String> {
        self.delivered()
            .iter()
            .flat_map(|b| b.events.iter().map(|e| e.event_type.clone()))
            .collect()
    }
}

#[async_trait]
impl CollectorTransport for RecordingTransport {
    async fn deliver(&self, batch: &BatchEnvelope) -> BeaconResult<()> {
        self.attempts.lock().unwrap().push(batch.clone());

        if self.failing.load(Ordering::SeqCst) {
            return Err(BeaconError::Unreachable("connection refused".into()));
        }
        if let Some(status) = self.scripted_failures.lock().unwrap().pop_front() {
            return Err(BeaconError::Rejected { status });
        }

        self.delivered.lock().unwrap().push(batch.clone());
        Ok(())
    }
}

/// Blocks inside `deliver` until released, to hold a dispatch in flight.
#[derive(Default)]
pub struct GatedTransport {
    pub entered: Notify,
    pub release: Notify,
    pub calls: Mutex<usize>,
}

#[async_trait]
impl CollectorTransport for GatedTransport {
    async fn deliver(&self, _batch: &BatchEnvelope) -> BeaconResult<()> {
        *self.calls.lock().unwrap() += 1;
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

// ── Builders ────────────────────────────────────────────────────

pub fn test_config() -> BeaconConfig {
    BeaconConfig::new("http://collector.test/track", "example.com")
}

/// A store holding a session that was active a moment ago, so engines
/// built on it resume instead of emitting `session_start`.
pub fn store_with_live_session(session_id: &str) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    seed_session(&store, session_id, now_ms() - 1_000);
    store
}

pub fn seed_session(store: &MemoryStore, session_id: &str, last_activity: i64) {
    let record = SessionRecord {
        id: SessionId::from(session_id),
        start: last_activity - 60_000,
        last_activity,
    };
    store
        .set(SESSION_KEY, &serde_json::to_string(&record).unwrap())
        .unwrap();
}

pub fn engine_with(store: Arc<MemoryStore>, transport: Arc<RecordingTransport>) -> TelemetryEngine {
    TelemetryEngine::new(test_config(), store, transport, None).unwrap()
}

/// Engine on a resumed session with an empty buffer.
pub fn quiet_engine() -> (TelemetryEngine, Arc<RecordingTransport>, Arc<MemoryStore>) {
    let store = store_with_live_session("s-live");
    let transport = RecordingTransport::new();
    let engine = engine_with(store.clone(), transport.clone());
    (engine, transport, store)
}

pub fn make_event(seq: usize) -> Event {
    Event {
        event_id: EventId::from(format!("evt-{seq}")),
        event_type: format!("e{seq}"),
        ts: seq as i64,
        site_id: "example.com".into(),
        uid: VisitorId::from("v-test"),
        session_id: SessionId::from("s-test"),
        meta: None,
        payload: serde_json::json!({ "seq": seq }),
    }
}

pub fn make_events(range: std::ops::Range<usize>) -> Vec<Event> {
    range.map(make_event).collect()
}

pub fn event_types<'a>(events: impl IntoIterator<Item = &'a Event>) -> Vec<String> {
    events.into_iter().map(|e| e.event_type.clone()).collect()
}

/// Decodes the persisted offline queue straight from storage.
pub fn persisted_queue(store: &MemoryStore) -> Vec<Event> {
    match store.get(QUEUE_KEY).unwrap() {
        Some(raw) => serde_json::from_str(&raw).unwrap(),
        None => Vec::new(),
    }
}

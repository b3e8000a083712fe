//! The telemetry engine: identity, session, queues, and the dispatcher.
//!
//! One engine exists per host context. Producers call `track` synchronously;
//! the runner (see `runtime`) calls `dispatch`, `heartbeat` and
//! `flush_on_exit` on timers and lifecycle signals.
//!
//! Both queues sit behind a single mutex that is only ever held for
//! synchronous steps. Nothing holds a lock across the delivery `.await`;
//! the in-flight flag keeps two dispatches from pulling the same durable
//! entries at once.

use crate::activity::{ActivitySignal, ActivityTracker};
use crate::buffer::TransientBuffer;
use crate::config::BeaconConfig;
use crate::durable_queue::DurableQueue;
use crate::error::BeaconResult;
use crate::event_factory::{EventFactory, MetadataProvider};
use crate::identity::get_or_create_visitor_id;
use crate::producer::{EventSink, Producer};
use crate::session::{SessionManager, SessionStart};
use crate::transport::{CollectorTransport, HttpCollector};
use crate::types::{BatchEnvelope, DispatchOutcome, ExitReason};

use beacon_storage::KeyValueStore;
use beacon_types::{Event, SessionId, VisitorId, now_ms};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

struct Queues {
    buffer: TransientBuffer,
    durable: DurableQueue,
}

struct SessionState {
    manager: SessionManager,
    activity: ActivityTracker,
}

/// Telemetry capture and delivery engine.
pub struct TelemetryEngine {
    config: BeaconConfig,
    visitor_id: VisitorId,
    factory: EventFactory,
    transport: Arc<dyn CollectorTransport>,
    session: Mutex<SessionState>,
    queues: Mutex<Queues>,
    online: AtomicBool,
    in_flight: AtomicBool,
    /// Epoch ms at construction; base for `session_duration_ms`.
    loaded_at: i64,
}

impl TelemetryEngine {
    /// Builds an engine from persisted state.
    ///
    /// Loads the visitor id, the offline queue and the session. If the
    /// session is new, a `session_start` event is buffered immediately.
    pub fn new(
        config: BeaconConfig,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn CollectorTransport>,
        metadata: Option<Arc<dyn MetadataProvider>>,
    ) -> BeaconResult<Self> {
        config.validate()?;
        let now = now_ms();
        let keys = config.storage_keys.clone();

        let visitor_id = get_or_create_visitor_id(store.as_ref(), &keys.visitor);
        let durable = DurableQueue::load(store.clone(), keys.offline_queue, config.queue_capacity);
        let (manager, start) =
            SessionManager::load(store, keys.session, config.session_timeout_ms, now);
        let factory = EventFactory::new(config.site_id.clone(), metadata);

        let mut buffer = TransientBuffer::new();
        if start == SessionStart::Started {
            buffer.append(session_start_event(
                &factory,
                &visitor_id,
                manager.session_id(),
                now,
            ));
        }

        info!(
            "telemetry engine ready for site {} (visitor {visitor_id}, session {})",
            config.site_id,
            manager.session_id()
        );

        let activity = ActivityTracker::new(config.activity_debounce_ms);
        Ok(Self {
            config,
            visitor_id,
            factory,
            transport,
            session: Mutex::new(SessionState { manager, activity }),
            queues: Mutex::new(Queues { buffer, durable }),
            online: AtomicBool::new(true),
            in_flight: AtomicBool::new(false),
            loaded_at: now,
        })
    }

    /// Builds an engine that delivers over HTTP to `config.collector_url`.
    pub fn with_http(
        config: BeaconConfig,
        store: Arc<dyn KeyValueStore>,
        metadata: Option<Arc<dyn MetadataProvider>>,
    ) -> BeaconResult<Self> {
        let transport = Arc::new(HttpCollector::new(&config)?);
        Self::new(config, store, transport, metadata)
    }

    // ── Producer entry points ──

    /// Tracks an event: marks activity, stamps the event, buffers it.
    pub fn track(&self, event_type: &str, payload: Value) {
        let now = now_ms();
        let (session_id, start) = {
            let mut state = lock(&self.session);
            let start = state.manager.touch(now);
            (state.manager.session_id().clone(), start)
        };
        self.enqueue_with_session(event_type, payload, session_id, start, now);
    }

    /// Extends the session on a raw interaction signal.
    pub fn record_activity(&self, signal: ActivitySignal) {
        let now = now_ms();
        let (session_id, start) = {
            let mut state = lock(&self.session);
            if !state.activity.accept(signal, now) {
                return;
            }
            let start = state.manager.touch(now);
            (state.manager.session_id().clone(), start)
        };
        if start == SessionStart::Started {
            let event = session_start_event(&self.factory, &self.visitor_id, &session_id, now);
            lock(&self.queues).buffer.append(event);
        }
    }

    /// Hands `producer` a sink that feeds this engine.
    pub fn attach_producer(self: &Arc<Self>, producer: &mut dyn Producer) {
        debug!("attaching producer {}", producer.name());
        let sink: Arc<dyn EventSink> = self.clone();
        producer.attach(sink);
    }

    // ── Timer and lifecycle entry points ──

    /// Runs one dispatch cycle.
    ///
    /// Offline: the buffer moves into the durable queue and nothing is sent.
    /// Online: one batch, durable entries first, is delivered; on failure the
    /// whole batch returns to the front of the durable queue.
    pub async fn dispatch(&self) -> DispatchOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("dispatch skipped, previous attempt still in flight");
            return DispatchOutcome::InFlight;
        };

        if !self.is_online() {
            let queued = self.persist_pending();
            debug!("offline, moved {queued} events to the offline queue");
            return DispatchOutcome::Offline { queued };
        }

        let batch_size = self.config.batch_size;
        let (events, from_durable) = {
            let mut queues = lock(&self.queues);
            let mut events = queues.durable.take_up_to(batch_size);
            let from_durable = events.len();
            if events.len() < batch_size {
                let room = batch_size - events.len();
                events.extend(queues.buffer.drain_up_to(room));
            }
            (events, from_durable)
        };

        if events.is_empty() {
            return DispatchOutcome::Idle;
        }

        let envelope = BatchEnvelope {
            site_id: self.config.site_id.clone(),
            uid: self.visitor_id.clone(),
            session_id: self.session_id(),
            events,
        };
        let count = envelope.len();

        let result = self.transport.deliver(&envelope).await;
        match result {
            Ok(()) => {
                if from_durable > 0 {
                    persist_durable(&mut lock(&self.queues).durable);
                }
                debug!("delivered {count} events ({from_durable} from offline queue)");
                DispatchOutcome::Delivered {
                    events: count,
                    from_durable,
                }
            }
            Err(e) => {
                if e.is_rejection() {
                    warn!("collector refused {count} events, requeueing: {e}");
                } else {
                    warn!("delivery of {count} events failed, requeueing: {e}");
                }
                let mut queues = lock(&self.queues);
                queues.durable.prepend_all(envelope.events);
                persist_durable(&mut queues.durable);
                DispatchOutcome::Requeued { events: count }
            }
        }
    }

    /// Handles the host hiding or unloading.
    ///
    /// Records `page_exit`, persists everything buffered before any network
    /// call, then runs one dispatch cycle.
    pub async fn flush_on_exit(&self, reason: ExitReason) -> DispatchOutcome {
        let now = now_ms();
        self.track(
            "page_exit",
            json!({
                "reason": reason.to_string(),
                "session_duration_ms": now - self.loaded_at,
            }),
        );
        self.persist_pending();
        self.dispatch().await
    }

    /// Tracks a `heartbeat` event with engine and activity age.
    pub fn heartbeat(&self) {
        let now = now_ms();
        let since_last_activity = now.saturating_sub(lock(&self.session).manager.last_active_at());
        self.track(
            "heartbeat",
            json!({
                "session_duration_ms": now - self.loaded_at,
                "since_last_activity_ms": since_last_activity,
            }),
        );
    }

    /// Moves every buffered event into the durable queue and persists it.
    ///
    /// Returns the number of events moved.
    pub fn persist_pending(&self) -> usize {
        let mut queues = lock(&self.queues);
        let pending = queues.buffer.drain_all();
        let moved = pending.len();
        queues.durable.append_all(pending);
        persist_durable(&mut queues.durable);
        moved
    }

    /// Updates the reachability signal.
    pub fn set_online(&self, online: bool) {
        let was = self.online.swap(online, Ordering::SeqCst);
        if was != online {
            info!("network reachability changed: online={online}");
        }
    }

    // ── Inspection ──

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn visitor_id(&self) -> &VisitorId {
        &self.visitor_id
    }

    pub fn session_id(&self) -> SessionId {
        lock(&self.session).manager.session_id().clone()
    }

    pub fn config(&self) -> &BeaconConfig {
        &self.config
    }

    /// Number of events waiting in the transient buffer.
    pub fn buffered_count(&self) -> usize {
        lock(&self.queues).buffer.len()
    }

    /// Number of events waiting in the durable queue.
    pub fn queued_count(&self) -> usize {
        lock(&self.queues).durable.len()
    }

    /// Snapshot of the transient buffer, oldest first.
    pub fn buffered_events(&self) -> Vec<Event> {
        lock(&self.queues).buffer.iter().cloned().collect()
    }

    /// Snapshot of the durable queue, oldest first.
    pub fn queued_events(&self) -> Vec<Event> {
        lock(&self.queues).durable.events().cloned().collect()
    }

    fn enqueue_with_session(
        &self,
        event_type: &str,
        payload: Value,
        session_id: SessionId,
        start: SessionStart,
        now: i64,
    ) {
        let mut events = Vec::with_capacity(2);
        if start == SessionStart::Started {
            events.push(session_start_event(&self.factory, &self.visitor_id, &session_id, now));
        }
        events.push(
            self.factory
                .build(event_type, payload, &self.visitor_id, &session_id, now),
        );

        let mut queues = lock(&self.queues);
        for event in events {
            queues.buffer.append(event);
        }
    }
}

impl EventSink for TelemetryEngine {
    fn track(&self, event_type: &str, payload: Value) {
        TelemetryEngine::track(self, event_type, payload);
    }

    fn record_activity(&self, signal: ActivitySignal) {
        TelemetryEngine::record_activity(self, signal);
    }
}

/// Clears the in-flight flag when the dispatch that set it finishes.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn session_start_event(
    factory: &EventFactory,
    uid: &VisitorId,
    session_id: &SessionId,
    now: i64,
) -> Event {
    factory.build(
        "session_start",
        json!({ "session_id": session_id, "session_start_ts": now }),
        uid,
        session_id,
        now,
    )
}

fn persist_durable(durable: &mut DurableQueue) {
    if let Err(e) = durable.persist() {
        warn!("offline queue persist failed, keeping it in memory: {e}");
    }
}

/// Telemetry must keep working after a panic elsewhere poisoned a lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

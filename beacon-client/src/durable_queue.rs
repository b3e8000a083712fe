//! Persisted backlog of undelivered events.
//!
//! The in-memory copy is authoritative. `persist` writes it out as one JSON
//! array holding the first (oldest) `capacity` entries. A failed write leaves
//! memory untouched, overflow included, until the next successful persist.

use beacon_storage::{KeyValueStore, StorageResult};
use beacon_types::Event;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// Capacity-bounded FIFO mirrored into a key-value store.
pub struct DurableQueue {
    store: Arc<dyn KeyValueStore>,
    key: String,
    capacity: usize,
    events: VecDeque<Event>,
}

impl DurableQueue {
    /// Loads the persisted queue. Missing, unreadable, or corrupt data
    /// loads as an empty queue.
    pub fn load(store: Arc<dyn KeyValueStore>, key: impl Into<String>, capacity: usize) -> Self {
        let key = key.into();
        let events = match store.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Event>>(&raw) {
                Ok(events) => events.into(),
                Err(e) => {
                    warn!("discarding corrupt offline queue: {e}");
                    VecDeque::new()
                }
            },
            Ok(None) => VecDeque::new(),
            Err(e) => {
                warn!("offline queue read failed, starting empty: {e}");
                VecDeque::new()
            }
        };

        if !events.is_empty() {
            debug!("loaded {} queued events", events.len());
        }

        Self {
            store,
            key,
            capacity,
            events,
        }
    }

    /// Appends events at the back, in order.
    pub fn append_all(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    /// Removes and returns up to `n` of the oldest events.
    pub fn take_up_to(&mut self, n: usize) -> Vec<Event> {
        let take = n.min(self.events.len());
        self.events.drain(..take).collect()
    }

    /// Puts events back at the front, ahead of everything already queued,
    /// keeping their relative order.
    pub fn prepend_all(&mut self, events: Vec<Event>) {
        for event in events.into_iter().rev() {
            self.events.push_front(event);
        }
    }

    /// Writes the first `capacity` events to storage.
    ///
    /// Events past capacity are dropped from memory only once the write has
    /// succeeded. Returns the number of events evicted.
    pub fn persist(&mut self) -> StorageResult<usize> {
        let kept: Vec<&Event> = self.events.iter().take(self.capacity).collect();
        let raw = serde_json::to_string(&kept)?;
        self.store.set(&self.key, &raw)?;

        let evicted = self.events.len().saturating_sub(self.capacity);
        if evicted > 0 {
            self.events.truncate(self.capacity);
            warn!("offline queue over capacity, dropped {evicted} newest events");
        }
        Ok(evicted)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }
}

//! In-memory event buffer filled between dispatch cycles.
//!
//! Events sit here from `track` until the dispatcher drains them into a
//! batch or, when offline or exiting, into the durable queue. Nothing here
//! survives process termination.

use beacon_types::Event;
use std::collections::VecDeque;

/// FIFO of freshly tracked events.
#[derive(Debug, Default)]
pub struct TransientBuffer {
    pending_events: VecDeque<Event>,
}

impl TransientBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an event at the back of the buffer.
    pub fn append(&mut self, event: Event) {
        self.pending_events.push_back(event);
    }

    /// Removes and returns up to `n` of the oldest events, oldest first.
    pub fn drain_up_to(&mut self, n: usize) -> Vec<Event> {
        let take = n.min(self.pending_events.len());
        self.pending_events.drain(..take).collect()
    }

    /// Removes and returns every buffered event, oldest first.
    pub fn drain_all(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending_events).into()
    }

    /// Returns the number of buffered events.
    pub fn len(&self) -> usize {
        self.pending_events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending_events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.pending_events.iter()
    }
}

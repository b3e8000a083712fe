//! Session lifecycle with sliding expiration.
//!
//! A session is active while `now - last_activity < timeout`. Expired
//! sessions are replaced, never extended. Every activity update is written
//! through to storage so a crash between activity and the next flush does
//! not split the session.

use beacon_storage::{KeyValueStore, StorageResult};
use beacon_types::{SessionId, SessionRecord};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How the current session came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStart {
    /// An unexpired persisted session was picked up.
    Resumed,
    /// A new session was created; the caller owes a `session_start` event.
    Started,
}

/// Owns the current session and its persisted record.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    key: String,
    timeout_ms: i64,
    current: SessionRecord,
    /// Cleared after the first failed write; the session then lives in memory only.
    persistent: bool,
}

impl SessionManager {
    /// Resumes the persisted session if still active at `now`, else starts one.
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        timeout_ms: i64,
        now: i64,
    ) -> (Self, SessionStart) {
        let key = key.into();
        let stored = match store.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<SessionRecord>(&raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("discarding unreadable session record: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("session read failed: {e}");
                None
            }
        };

        if let Some(record) = stored.filter(|r| r.is_active_at(now, timeout_ms)) {
            debug!("resuming session {}", record.id);
            let manager = Self {
                store,
                key,
                timeout_ms,
                current: record,
                persistent: true,
            };
            return (manager, SessionStart::Resumed);
        }

        let mut manager = Self {
            store,
            key,
            timeout_ms,
            current: new_record(now),
            persistent: true,
        };
        info!("started session {}", manager.current.id);
        manager.write_through();
        (manager, SessionStart::Started)
    }

    /// Records activity at `now`.
    ///
    /// If the session already expired (the host sat idle past the timeout),
    /// it is superseded by a fresh one and `Started` is returned.
    pub fn touch(&mut self, now: i64) -> SessionStart {
        let outcome = if self.current.is_active_at(now, self.timeout_ms) {
            self.current.last_activity = now;
            SessionStart::Resumed
        } else {
            let previous = self.current.id.clone();
            self.current = new_record(now);
            info!("session {previous} expired, started {}", self.current.id);
            SessionStart::Started
        };
        self.write_through();
        outcome
    }

    pub fn session_id(&self) -> &SessionId {
        &self.current.id
    }

    pub fn started_at(&self) -> i64 {
        self.current.start
    }

    pub fn last_active_at(&self) -> i64 {
        self.current.last_activity
    }

    pub fn record(&self) -> &SessionRecord {
        &self.current
    }

    /// False once a write has failed and the session went memory-only.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Writes the current record to storage.
    pub fn persist(&self) -> StorageResult<()> {
        let raw = serde_json::to_string(&self.current)?;
        self.store.set(&self.key, &raw)
    }

    fn write_through(&mut self) {
        if !self.persistent {
            return;
        }
        if let Err(e) = self.persist() {
            warn!("session write failed, continuing in memory: {e}");
            self.persistent = false;
        }
    }
}

fn new_record(now: i64) -> SessionRecord {
    SessionRecord {
        id: SessionId::generate(),
        start: now,
        last_activity: now,
    }
}

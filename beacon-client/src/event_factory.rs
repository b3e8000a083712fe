//! Stamps producer payloads into complete events.

use beacon_types::{Event, EventId, PageMeta, SessionId, VisitorId};
use serde_json::Value;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Failure reported by a metadata provider.
#[derive(Debug, Error)]
#[error("page metadata unavailable: {0}")]
pub struct MetadataError(pub String);

/// Supplies page/device context for each event.
///
/// Implementations live outside the core (they know about the host page).
/// Any closure `Fn() -> Result<PageMeta, MetadataError>` qualifies.
pub trait MetadataProvider: Send + Sync {
    fn page_meta(&self) -> Result<PageMeta, MetadataError>;
}

impl<F> MetadataProvider for F
where
    F: Fn() -> Result<PageMeta, MetadataError> + Send + Sync,
{
    fn page_meta(&self) -> Result<PageMeta, MetadataError> {
        self()
    }
}

/// Builds immutable events. Never fails.
pub struct EventFactory {
    site_id: String,
    metadata: Option<Arc<dyn MetadataProvider>>,
}

impl EventFactory {
    pub fn new(site_id: impl Into<String>, metadata: Option<Arc<dyn MetadataProvider>>) -> Self {
        Self {
            site_id: site_id.into(),
            metadata,
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    /// Builds an event stamped with identity, session, and time `now`.
    ///
    /// A `null` payload becomes `{}`. Provider errors and panics leave
    /// `meta` empty.
    pub fn build(
        &self,
        event_type: &str,
        payload: Value,
        uid: &VisitorId,
        session_id: &SessionId,
        now: i64,
    ) -> Event {
        let payload = match payload {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        Event {
            event_id: EventId::generate(),
            event_type: event_type.to_string(),
            ts: now,
            site_id: self.site_id.clone(),
            uid: uid.clone(),
            session_id: session_id.clone(),
            meta: self.collect_meta(),
            payload,
        }
    }

    fn collect_meta(&self) -> Option<PageMeta> {
        let provider = self.metadata.as_ref()?;
        match catch_unwind(AssertUnwindSafe(|| provider.page_meta())) {
            Ok(Ok(meta)) => Some(meta),
            Ok(Err(e)) => {
                warn!("{e}");
                None
            }
            Err(_) => {
                warn!("metadata provider panicked");
                None
            }
        }
    }
}

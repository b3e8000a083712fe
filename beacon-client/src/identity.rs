//! Durable anonymous visitor identity.

use beacon_storage::KeyValueStore;
use beacon_types::VisitorId;
use tracing::{debug, warn};

/// Returns the persisted visitor id, creating one on first run.
///
/// A missing, empty, or unreadable record yields a fresh id. Exactly one
/// write is attempted for a fresh id; if it fails the id is used for this
/// engine only and the next construction generates another.
pub fn get_or_create_visitor_id(store: &dyn KeyValueStore, key: &str) -> VisitorId {
    match store.get(key) {
        Ok(Some(existing)) if !existing.trim().is_empty() => {
            return VisitorId::from(existing.trim());
        }
        Ok(_) => debug!("no visitor id under {key}, generating one"),
        Err(e) => warn!("visitor id read failed, using ephemeral id: {e}"),
    }

    let visitor = VisitorId::generate();
    if let Err(e) = store.set(key, visitor.as_str()) {
        warn!("visitor id write failed: {e}");
    }
    visitor
}

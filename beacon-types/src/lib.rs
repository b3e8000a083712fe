//! Core data model for Beacon.
//!
//! Everything that crosses a crate boundary or gets persisted lives here:
//! - Identifiers (`VisitorId`, `SessionId`, `EventId`)
//! - The tracked `Event` and its optional `PageMeta` enrichment block
//! - The persisted `SessionRecord`

mod event;
mod id;
mod session;

pub use event::{Event, PageMeta};
pub use id::{EventId, SessionId, VisitorId, generate_id};
pub use session::SessionRecord;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

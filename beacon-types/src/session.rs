use crate::SessionId;
use serde::{Deserialize, Serialize};

/// Persisted shape of the current session.
///
/// Field names match the record written by earlier page SDK releases so
/// existing sessions survive an upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    /// Epoch milliseconds when the session started.
    pub start: i64,
    /// Epoch milliseconds of the last qualifying activity.
    #[serde(rename = "lastActivity")]
    pub last_activity: i64,
}

impl SessionRecord {
    /// True if the session is still live at `now` for the given timeout.
    pub fn is_active_at(&self, now: i64, timeout_ms: i64) -> bool {
        now.saturating_sub(self.last_activity) < timeout_ms
    }
}

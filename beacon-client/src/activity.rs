//! Liveness signals that keep a session open.

use serde::{Deserialize, Serialize};

/// Raw interaction classes a host can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivitySignal {
    Click,
    Scroll,
    KeyDown,
    MouseMove,
    TouchStart,
}

/// Decides which activity signals are worth a session write.
///
/// With a zero debounce window every signal passes. A positive window
/// coalesces bursts (mouse moves, scroll) into one write per window.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    debounce_ms: i64,
    last_accepted: Option<i64>,
}

impl ActivityTracker {
    pub fn new(debounce_ms: i64) -> Self {
        Self {
            debounce_ms: debounce_ms.max(0),
            last_accepted: None,
        }
    }

    /// Returns true if the signal at `now` should touch the session.
    pub fn accept(&mut self, _signal: ActivitySignal, now: i64) -> bool {
        let due = match self.last_accepted {
            Some(last) => now - last >= self.debounce_ms,
            None => true,
        };
        if due {
            self.last_accepted = Some(now);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_debounce_accepts_everything() {
        let mut tracker = ActivityTracker::new(0);
        assert!(tracker.accept(ActivitySignal::MouseMove, 10));
        assert!(tracker.accept(ActivitySignal::MouseMove, 10));
        assert!(tracker.accept(ActivitySignal::Click, 11));
    }

    #[test]
    fn debounce_coalesces_bursts() {
        let mut tracker = ActivityTracker::new(1_000);
        assert!(tracker.accept(ActivitySignal::Scroll, 0));
        assert!(!tracker.accept(ActivitySignal::Scroll, 500));
        assert!(!tracker.accept(ActivitySignal::KeyDown, 999));
        assert!(tracker.accept(ActivitySignal::KeyDown, 1_000));
    }

    #[test]
    fn signal_names_serialize_lowercase() {
        let json = serde_json::to_string(&ActivitySignal::TouchStart).unwrap();
        assert_eq!(json, "\"touchstart\"");
    }
}

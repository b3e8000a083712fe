use crate::{EventId, SessionId, VisitorId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page and device context attached to every event.
///
/// All fields are optional; a provider fills in what it can observe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page_url: Option<String>,
    pub page_title: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub language: Option<String>,
    pub viewport_width: Option<u32>,
    pub viewport_height: Option<u32>,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    pub scroll_y: Option<f64>,
    pub scroll_percent: Option<u8>,
}

/// A single tracked observation, stamped with identity and session.
///
/// Events are immutable once built; queues move them, never edit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    /// Producer-defined type, possibly parameterized (`"click_button:submit"`).
    pub event_type: String,
    /// Epoch milliseconds at construction.
    pub ts: i64,
    pub site_id: String,
    pub uid: VisitorId,
    pub session_id: SessionId,
    /// Enrichment block. `None` when the metadata provider failed.
    #[serde(default)]
    pub meta: Option<PageMeta>,
    #[serde(default = "empty_payload")]
    pub payload: Value,
}

fn empty_payload() -> Value {
    Value::Object(Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Event {
        Event {
            event_id: EventId::from("e1"),
            event_type: "click_button:submit".into(),
            ts: 1_700_000_000_000,
            site_id: "example.com".into(),
            uid: VisitorId::from("v1"),
            session_id: SessionId::from("s1"),
            meta: Some(PageMeta {
                page_url: Some("https://example.com/".into()),
                viewport_width: Some(1280),
                ..Default::default()
            }),
            payload: serde_json::json!({ "x": 10, "y": 20 }),
        }
    }

    #[test]
    fn wire_shape_uses_collector_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        for field in ["event_id", "event_type", "ts", "site_id", "uid", "session_id", "meta", "payload"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert_eq!(json["uid"], "v1");
        assert_eq!(json["meta"]["viewport_width"], 1280);
    }

    #[test]
    fn missing_meta_and_payload_get_defaults() {
        let json = r#"{"event_id":"e","event_type":"t","ts":1,"site_id":"s","uid":"u","session_id":"x"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert!(event.meta.is_none());
        assert_eq!(event.payload, serde_json::json!({}));
    }

    #[test]
    fn event_array_roundtrips_in_order() {
        let mut second = sample();
        second.event_id = EventId::from("e2");
        let events = vec![sample(), second];
        let json = serde_json::to_string(&events).unwrap();
        let back: Vec<Event> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, events);
    }
}

mod support;

use beacon_client::{
    BatchEnvelope, BeaconConfig, BeaconError, CollectorTransport, DispatchOutcome, HttpCollector,
    TelemetryEngine,
};
use beacon_types::{SessionId, VisitorId};
use std::sync::Arc;
use support::{event_types, make_events, store_with_live_session};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> BeaconConfig {
    BeaconConfig::new(format!("{}/track", server.uri()), "example.com")
}

fn envelope(count: usize) -> BatchEnvelope {
    BatchEnvelope {
        site_id: "example.com".into(),
        uid: VisitorId::from("v-1"),
        session_id: SessionId::from("s-1"),
        events: make_events(0..count),
    }
}

// --- HttpCollector ---

#[tokio::test]
async fn deliver_posts_json_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/track"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "site_id": "example.com",
            "uid": "v-1",
            "session_id": "s-1",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let collector = HttpCollector::new(&config_for(&server)).unwrap();
    collector.deliver(&envelope(3)).await.unwrap();
}

#[tokio::test]
async fn deliver_sends_every_event_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/track"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let collector = HttpCollector::new(&config_for(&server)).unwrap();
    collector.deliver(&envelope(4)).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: BatchEnvelope = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(event_types(&body.events), vec!["e0", "e1", "e2", "e3"]);
}

#[tokio::test]
async fn any_2xx_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let collector = HttpCollector::new(&config_for(&server)).unwrap();
    assert!(collector.deliver(&envelope(1)).await.is_ok());
}

#[tokio::test]
async fn server_error_is_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let collector = HttpCollector::new(&config_for(&server)).unwrap();
    let err = collector.deliver(&envelope(1)).await.unwrap_err();
    assert!(matches!(err, BeaconError::Rejected { status: 500 }));
    assert!(err.is_rejection());
}

#[tokio::test]
async fn client_error_is_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    let collector = HttpCollector::new(&config_for(&server)).unwrap();
    let err = collector.deliver(&envelope(1)).await.unwrap_err();
    assert!(matches!(err, BeaconError::Rejected { status: 422 }));
}

#[tokio::test]
async fn connection_refused_is_unreachable() {
    // Nothing listens on port 9 on a test host.
    let config = BeaconConfig::new("http://127.0.0.1:9/track", "example.com");
    let collector = HttpCollector::new(&config).unwrap();
    let err = collector.deliver(&envelope(1)).await.unwrap_err();
    assert!(matches!(err, BeaconError::Unreachable(_)));
    assert!(!err.is_rejection());
}

#[tokio::test]
async fn slow_collector_times_out_as_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.request_timeout_secs = 1;
    let collector = HttpCollector::new(&config).unwrap();
    let err = collector.deliver(&envelope(1)).await.unwrap_err();
    assert!(matches!(err, BeaconError::Unreachable(_)));
}

// --- Engine over HTTP ---

#[tokio::test]
async fn engine_with_http_delivers_tracked_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/track"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with_live_session("s-http");
    let engine = TelemetryEngine::with_http(config_for(&server), store, None).unwrap();
    engine.track("page_view", serde_json::json!({ "entry_scroll_percent": 0 }));
    engine.track("click", serde_json::json!({ "tag": "button" }));

    let outcome = engine.dispatch().await;
    assert_eq!(outcome, DispatchOutcome::Delivered { events: 2, from_durable: 0 });

    let requests = server.received_requests().await.unwrap();
    let body: BatchEnvelope = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body.session_id.as_str(), "s-http");
    assert_eq!(event_types(&body.events), vec!["page_view", "click"]);
    assert!(body.events.iter().all(|e| e.uid == body.uid));
}

#[tokio::test]
async fn engine_with_http_requeues_on_500() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = store_with_live_session("s-http");
    let engine = Arc::new(TelemetryEngine::with_http(config_for(&server), store, None).unwrap());
    engine.track("click", serde_json::json!({}));

    assert_eq!(engine.dispatch().await, DispatchOutcome::Requeued { events: 1 });
    assert_eq!(engine.queued_count(), 1);
    assert_eq!(engine.buffered_count(), 0);
}

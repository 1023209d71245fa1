//! Session delivery against a mock collector
//!
//! Unlike events, unexpected session failures reach the caller as errors.

use faultline_core::domain::{DeliveryOutcome, DeliveryParams, HEADER_INTEGRITY, HEADER_PAYLOAD_VERSION};
use faultline_delivery::{Delivery, DeliveryError, Payload, SessionPayload};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

fn sample_session() -> SessionPayload {
    SessionPayload::new(json!({
        "sessionCounts": [{"startedAt": "2026-01-15T10:00:00Z", "sessionsStarted": 1}]
    }))
}

#[tokio::test]
async fn test_session_accepted_is_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::SESSIONS_PATH))
        .and(header(HEADER_PAYLOAD_VERSION, "1.0"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::test_client(5_000);
    let outcome = client
        .deliver_session(&sample_session(), &common::session_params(&server))
        .await
        .expect("session delivery");

    assert_eq!(outcome, DeliveryOutcome::Delivered);
}

#[tokio::test]
async fn test_session_server_error_is_undelivered() {
    let server = common::setup_collector(common::SESSIONS_PATH, 503).await;
    let client = common::test_client(5_000);

    let outcome = client
        .deliver(
            Payload::Session(&sample_session()),
            &common::session_params(&server),
        )
        .await
        .unwrap();

    assert_eq!(outcome, DeliveryOutcome::Undelivered);
}

#[tokio::test]
async fn test_session_never_sends_integrity_header() {
    let server = common::setup_collector(common::SESSIONS_PATH, 200).await;
    let client = common::test_client(5_000);

    client
        .deliver_session(&sample_session(), &common::session_params(&server))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get(HEADER_INTEGRITY).is_none());
}

#[tokio::test]
async fn test_session_transport_error_propagates() {
    let client = common::test_client(2_000);
    let params = DeliveryParams::for_session(common::closed_port_url(), None);

    let err = client
        .deliver_session(&sample_session(), &params)
        .await
        .unwrap_err();

    assert!(matches!(err, DeliveryError::Transport(_)));
}

#[tokio::test]
async fn test_session_invalid_header_propagates() {
    let server = common::setup_collector(common::SESSIONS_PATH, 200).await;
    let client = common::test_client(5_000);
    let params = common::session_params(&server).with_header("bad name", Some("v".into()));

    let err = client
        .deliver_session(&sample_session(), &params)
        .await
        .unwrap_err();

    assert!(matches!(err, DeliveryError::InvalidHeader { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

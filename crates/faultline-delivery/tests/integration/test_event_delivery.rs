//! Event delivery against a mock collector
//!
//! Event delivery never returns an error; every failure must map to the
//! right outcome.

use std::{sync::Arc, time::Duration};

use faultline_core::domain::{
    DeliveryOutcome, DeliveryParams, HEADER_API_KEY, HEADER_INTEGRITY, HEADER_PAYLOAD_VERSION,
};
use faultline_delivery::{Delivery, DeliveryMetrics, EventPayload, HttpDelivery, Payload};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

fn sample_event() -> EventPayload {
    EventPayload::new(json!({
        "apiKey": "test-key",
        "events": [{"exceptions": [{"errorClass": "IllegalStateException"}]}]
    }))
}

#[tokio::test]
async fn test_event_accepted_is_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::NOTIFY_PATH))
        .and(header(HEADER_API_KEY, "test-key"))
        .and(header(HEADER_PAYLOAD_VERSION, "4.0"))
        .and(header("content-type", "application/json"))
        .and(body_json(sample_event().body()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::test_client(5_000);
    let outcome = client
        .deliver_event(&sample_event(), &common::event_params(&server))
        .await;

    assert_eq!(outcome, DeliveryOutcome::Delivered);
}

#[tokio::test]
async fn test_event_server_error_is_undelivered() {
    let server = common::setup_collector(common::NOTIFY_PATH, 500).await;
    let client = common::test_client(5_000);

    let outcome = client
        .deliver_event(&sample_event(), &common::event_params(&server))
        .await;

    assert_eq!(outcome, DeliveryOutcome::Undelivered);
}

#[tokio::test]
async fn test_event_client_error_classification() {
    let server = common::setup_collector(common::NOTIFY_PATH, 400).await;

    let lenient = common::test_client(5_000);
    assert_eq!(
        lenient
            .deliver_event(&sample_event(), &common::event_params(&server))
            .await,
        DeliveryOutcome::Undelivered
    );

    let strict = common::test_client(5_000)
        .with_status_policy(faultline_core::domain::StatusPolicy::new(true));
    assert_eq!(
        strict
            .deliver_event(&sample_event(), &common::event_params(&server))
            .await,
        DeliveryOutcome::Failed
    );
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::NOTIFY_PATH))
        .respond_with(ResponseTemplate::new(307).insert_header("Location", "/elsewhere"))
        .mount(&server)
        .await;

    let client = common::test_client(5_000);
    let outcome = client
        .deliver_event(&sample_event(), &common::event_params(&server))
        .await;

    assert_eq!(outcome, DeliveryOutcome::Delivered);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_serialization_exhaustion_is_undelivered() {
    let server = common::setup_collector(common::NOTIFY_PATH, 200).await;
    let client = common::test_client(5_000).with_serialization_limit(16);

    let outcome = client
        .deliver_event(&sample_event(), &common::event_params(&server))
        .await;

    assert_eq!(outcome, DeliveryOutcome::Undelivered);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_connection_refused_is_undelivered() {
    let client = common::test_client(2_000);
    let params = DeliveryParams::for_event(common::closed_port_url(), Some("test-key"));

    let outcome = client.deliver_event(&sample_event(), &params).await;

    assert_eq!(outcome, DeliveryOutcome::Undelivered);
}

#[tokio::test]
async fn test_timeout_is_undelivered() {
    let server =
        common::setup_slow_collector(common::NOTIFY_PATH, Duration::from_millis(1_500)).await;
    let client = common::test_client(100);

    let outcome = client
        .deliver_event(&sample_event(), &common::event_params(&server))
        .await;

    assert_eq!(outcome, DeliveryOutcome::Undelivered);
}

#[tokio::test]
async fn test_invalid_header_is_failed() {
    let server = common::setup_collector(common::NOTIFY_PATH, 200).await;
    let client = common::test_client(5_000);
    let params =
        common::event_params(&server).with_header("X-Broken", Some("line\nbreak".to_string()));

    let outcome = client.deliver_event(&sample_event(), &params).await;

    assert_eq!(outcome, DeliveryOutcome::Failed);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unsupported_scheme_is_failed() {
    let client = common::test_client(5_000);
    let params = DeliveryParams::new("ftp://collector.invalid/notify");

    let outcome = client.deliver_event(&sample_event(), &params).await;

    assert_eq!(outcome, DeliveryOutcome::Failed);
}

#[tokio::test]
async fn test_none_header_absent_and_integrity_present() {
    let server = common::setup_collector(common::NOTIFY_PATH, 202).await;
    let client = common::test_client(5_000);
    let params = common::event_params(&server)
        .with_header("X-Optional", None)
        .with_header("X-Build", Some("1234".to_string()));
    let payload = sample_event()
        .with_computed_integrity(client.serialization_limit())
        .unwrap();

    let outcome = client.deliver_event(&payload, &params).await;
    assert_eq!(outcome, DeliveryOutcome::Delivered);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let headers = &requests[0].headers;

    assert!(headers.get("x-optional").is_none());
    assert_eq!(headers.get("x-build").unwrap(), "1234");
    assert_eq!(
        headers.get(HEADER_INTEGRITY).unwrap().to_str().unwrap(),
        payload.integrity_token().unwrap()
    );
}

#[tokio::test]
async fn test_no_integrity_header_without_token() {
    let server = common::setup_collector(common::NOTIFY_PATH, 200).await;
    let client = common::test_client(5_000);

    client
        .deliver_event(&sample_event(), &common::event_params(&server))
        .await;

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get(HEADER_INTEGRITY).is_none());
}

#[tokio::test]
async fn test_dispatch_through_payload_enum_records_metrics() {
    let server = common::setup_collector(common::NOTIFY_PATH, 200).await;
    let metrics = Arc::new(DeliveryMetrics::new().unwrap());
    let client: Box<dyn Delivery> =
        Box::new(common::test_client(5_000).with_metrics(metrics.clone()));
    let event = sample_event();

    let outcome = client
        .deliver(Payload::Event(&event), &common::event_params(&server))
        .await
        .unwrap();

    assert_eq!(outcome, DeliveryOutcome::Delivered);
    assert_eq!(metrics.delivery_count("event", DeliveryOutcome::Delivered), 1);
    assert!(metrics.encode().unwrap().contains("faultline_payload_bytes"));
}

#[tokio::test]
async fn test_default_client_delivers() {
    let server = common::setup_collector(common::NOTIFY_PATH, 200).await;
    let client = HttpDelivery::new().unwrap();

    let outcome = client
        .deliver_event(&sample_event(), &common::event_params(&server))
        .await;

    assert_eq!(outcome, DeliveryOutcome::Delivered);
}

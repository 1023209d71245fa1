//! Shared helpers for delivery integration tests
//!
//! Each helper mounts a collector endpoint on a wiremock server and returns a
//! client plus the matching delivery parameters.

use std::{net::TcpListener, time::Duration};

use faultline_core::{config::ConfigBuilder, domain::DeliveryParams};
use faultline_delivery::HttpDelivery;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const NOTIFY_PATH: &str = "/notify";
pub const SESSIONS_PATH: &str = "/sessions";

/// Starts a collector that answers POSTs on `route` with `status`.
pub async fn setup_collector(route: &str, status: u16) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;

    server
}

/// Starts a collector that waits `delay` before answering 200.
pub async fn setup_slow_collector(route: &str, delay: Duration) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_delay(delay))
        .mount(&server)
        .await;

    server
}

/// Client with a short timeout so transport failures resolve quickly.
pub fn test_client(timeout_ms: u64) -> HttpDelivery {
    let config = ConfigBuilder::new().delivery_timeout_ms(timeout_ms).build();
    HttpDelivery::from_config(&config.delivery).expect("build client")
}

pub fn event_params(server: &MockServer) -> DeliveryParams {
    DeliveryParams::for_event(format!("{}{}", server.uri(), NOTIFY_PATH), Some("test-key"))
}

pub fn session_params(server: &MockServer) -> DeliveryParams {
    DeliveryParams::for_session(
        format!("{}{}", server.uri(), SESSIONS_PATH),
        Some("test-key"),
    )
}

/// A loopback URL nobody is listening on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}/notify")
}

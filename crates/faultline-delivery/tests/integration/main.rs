//! Integration tests for faultline-delivery
//!
//! Uses wiremock to stand in for the collector and verifies the request
//! shape and outcome classification of HttpDelivery end to end.

mod common;

mod test_event_delivery;
mod test_session_delivery;

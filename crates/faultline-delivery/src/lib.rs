//! Faultline Delivery - Sends serialized reports to the collector
//!
//! Provides:
//! - Bounded payload serialization with an explicit memory ceiling
//! - Ordered header assembly with optional integrity tokens
//! - The [`Delivery`](client::Delivery) trait and its reqwest implementation
//! - Prometheus counters for delivery outcomes
//!
//! ## Modules
//!
//! - [`client`] - `Delivery` trait and `HttpDelivery`
//! - [`payload`] - `SessionPayload`, `EventPayload` and bounded serialization
//! - [`headers`] - request header assembly
//! - [`metrics`] - `DeliveryMetrics`

pub mod client;
pub mod headers;
pub mod metrics;
pub mod payload;

use faultline_core::domain::DeliveryOutcome;
use thiserror::Error;

pub use client::{Delivery, HttpDelivery};
pub use metrics::DeliveryMetrics;
pub use payload::{EventPayload, Payload, PayloadError, SessionPayload};

/// Errors that can occur while delivering a payload
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The payload could not be serialized
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    /// A header name or value cannot be sent over HTTP
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader {
        /// Offending header name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// The endpoint is not an absolute URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// Connecting, sending or receiving failed
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl DeliveryError {
    /// Outcome an event delivery reports when it fails with this error
    ///
    /// Memory exhaustion and transport trouble are transient. Everything else
    /// would fail the same way on every retry.
    pub fn event_outcome(&self) -> DeliveryOutcome {
        match self {
            DeliveryError::Payload(PayloadError::OutOfMemory { .. }) => DeliveryOutcome::Undelivered,
            DeliveryError::Payload(PayloadError::Serialize(_)) => DeliveryOutcome::Failed,
            DeliveryError::InvalidHeader { .. } | DeliveryError::InvalidUrl(_) => {
                DeliveryOutcome::Failed
            }
            DeliveryError::Transport(e) if e.is_builder() => DeliveryOutcome::Failed,
            DeliveryError::Transport(_) => DeliveryOutcome::Undelivered,
        }
    }
}

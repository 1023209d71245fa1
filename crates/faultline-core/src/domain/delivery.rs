//! Delivery outcome and request parameters
//!
//! [`DeliveryOutcome`] is the tri-state result of a single delivery attempt.
//! The external payload store uses it (through [`PayloadDisposition`]) to
//! decide whether to delete, keep or drop a payload.

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Header carrying the collector API key
pub const HEADER_API_KEY: &str = "Faultline-Api-Key";
/// Header carrying the payload schema version
pub const HEADER_PAYLOAD_VERSION: &str = "Faultline-Payload-Version";
/// Header carrying the time the request was sent
pub const HEADER_SENT_AT: &str = "Faultline-Sent-At";
/// Header carrying the event payload integrity token
pub const HEADER_INTEGRITY: &str = "Faultline-Integrity";

const EVENT_PAYLOAD_VERSION: &str = "4.0";
const SESSION_PAYLOAD_VERSION: &str = "1.0";

// ============================================================================
// DeliveryOutcome
// ============================================================================

/// Result of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// The collector accepted the payload
    Delivered,
    /// Transient failure; the payload should be kept and retried later
    Undelivered,
    /// Non-recoverable failure; the payload should not be retried as-is
    Failed,
}

impl DeliveryOutcome {
    /// Classifies an HTTP status code with the default [`StatusPolicy`]
    pub fn for_status(status: u16) -> Self {
        StatusPolicy::default().classify(status)
    }

    /// What the payload store should do with the payload afterwards
    pub fn disposition(self) -> PayloadDisposition {
        match self {
            DeliveryOutcome::Delivered => PayloadDisposition::Delete,
            DeliveryOutcome::Undelivered => PayloadDisposition::Retain,
            DeliveryOutcome::Failed => PayloadDisposition::Discard,
        }
    }

    /// Returns true if the payload is worth another attempt later
    pub fn is_retryable(self) -> bool {
        self == DeliveryOutcome::Undelivered
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Undelivered => "undelivered",
            DeliveryOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action the payload store takes after a delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadDisposition {
    /// Delivered: remove the stored copy
    Delete,
    /// Keep the stored copy for a later flush
    Retain,
    /// Drop the stored copy and report the failure
    Discard,
}

// ============================================================================
// StatusPolicy
// ============================================================================

/// Maps HTTP status codes to a [`DeliveryOutcome`]
///
/// Codes below 400 are `Delivered`; 4xx and 5xx are `Undelivered`. When
/// `drop_unrecoverable_client_errors` is set, 4xx codes other than
/// 408 (Request Timeout) and 429 (Too Many Requests) are `Failed` because the
/// collector will reject that payload no matter how often it is resent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusPolicy {
    pub drop_unrecoverable_client_errors: bool,
}

impl StatusPolicy {
    pub fn new(drop_unrecoverable_client_errors: bool) -> Self {
        Self {
            drop_unrecoverable_client_errors,
        }
    }

    pub fn classify(&self, status: u16) -> DeliveryOutcome {
        match status {
            100..=399 => DeliveryOutcome::Delivered,
            408 | 429 => DeliveryOutcome::Undelivered,
            400..=499 if self.drop_unrecoverable_client_errors => DeliveryOutcome::Failed,
            _ => DeliveryOutcome::Undelivered,
        }
    }
}

// ============================================================================
// DeliveryParams
// ============================================================================

/// Destination and headers for one delivery
///
/// Headers keep their insertion order. A header whose value is `None` is
/// part of the mapping but is never sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryParams {
    endpoint: String,
    headers: Vec<(String, Option<String>)>,
}

impl DeliveryParams {
    /// Creates parameters with no headers
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            headers: Vec::new(),
        }
    }

    /// Standard headers for an event (error report) payload
    pub fn for_event(endpoint: impl Into<String>, api_key: Option<&str>) -> Self {
        Self::standard(endpoint, api_key, EVENT_PAYLOAD_VERSION)
    }

    /// Standard headers for a session payload
    pub fn for_session(endpoint: impl Into<String>, api_key: Option<&str>) -> Self {
        Self::standard(endpoint, api_key, SESSION_PAYLOAD_VERSION)
    }

    fn standard(endpoint: impl Into<String>, api_key: Option<&str>, version: &str) -> Self {
        let sent_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        Self::new(endpoint)
            .with_header(HEADER_API_KEY, api_key.map(str::to_string))
            .with_header(HEADER_PAYLOAD_VERSION, Some(version.to_string()))
            .with_header(HEADER_SENT_AT, Some(sent_at))
            .with_header("Content-Type", Some("application/json".to_string()))
    }

    /// Adds or replaces a header, keeping the existing position on replace.
    /// Names compare case-insensitively.
    pub fn with_header(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// All headers in insertion order, including `None`-valued ones
    pub fn headers(&self) -> &[(String, Option<String>)] {
        &self.headers
    }

    /// Headers that will actually be sent, in insertion order
    pub fn present_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (name.as_str(), v)))
    }
}

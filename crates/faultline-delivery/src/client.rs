//! Delivery client
//!
//! Performs the single HTTP round trip for a serialized payload and turns the
//! result into a [`DeliveryOutcome`]. There is no retry loop here: callers
//! keep `Undelivered` payloads and flush them again later.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use faultline_core::domain::DeliveryParams;
//! use faultline_delivery::{Delivery, EventPayload, HttpDelivery};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = HttpDelivery::new()?;
//! let payload = EventPayload::new(serde_json::json!({"events": []}));
//! let params = DeliveryParams::for_event("https://notify.faultline.dev", Some("api-key"));
//! let outcome = client.deliver_event(&payload, &params).await;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use faultline_core::{
    config::DeliveryConfig,
    domain::{DeliveryOutcome, DeliveryParams, StatusPolicy},
};
use reqwest::{
    header::{HeaderName, HeaderValue},
    redirect, Client, Url,
};
use tracing::{debug, warn};

use crate::{
    headers,
    metrics::DeliveryMetrics,
    payload::{EventPayload, Payload, SessionPayload, DEFAULT_SERIALIZATION_LIMIT},
    DeliveryError,
};

// ============================================================================
// Delivery trait
// ============================================================================

/// Sends payloads to the collector
///
/// Session delivery reports unexpected problems as errors; event delivery
/// always resolves to an outcome so fault handlers never see a secondary
/// failure.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Delivers a session payload
    ///
    /// # Errors
    /// Serialization, header, URL and transport failures are returned as-is.
    async fn deliver_session(
        &self,
        payload: &SessionPayload,
        params: &DeliveryParams,
    ) -> Result<DeliveryOutcome, DeliveryError>;

    /// Delivers an event payload, absorbing every failure into the outcome
    async fn deliver_event(&self, payload: &EventPayload, params: &DeliveryParams)
        -> DeliveryOutcome;

    /// Delivers either payload kind
    async fn deliver(
        &self,
        payload: Payload<'_>,
        params: &DeliveryParams,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        match payload {
            Payload::Session(session) => self.deliver_session(session, params).await,
            Payload::Event(event) => Ok(self.deliver_event(event, params).await),
        }
    }
}

// ============================================================================
// HttpDelivery
// ============================================================================

/// [`Delivery`] over HTTP POST with reqwest
#[derive(Debug, Clone)]
pub struct HttpDelivery {
    /// Shared HTTP client; redirects are never followed
    client: Client,
    /// Status code classification
    status_policy: StatusPolicy,
    /// Serialization ceiling in bytes
    serialization_limit: usize,
    /// Optional outcome counters
    metrics: Option<Arc<DeliveryMetrics>>,
}

impl HttpDelivery {
    /// Creates a client with default settings and no request timeout
    pub fn new() -> Result<Self, DeliveryError> {
        let client = Client::builder().redirect(redirect::Policy::none()).build()?;
        Ok(Self::with_client(client))
    }

    /// Wraps an existing reqwest client. Its redirect policy is used as-is.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            status_policy: StatusPolicy::default(),
            serialization_limit: DEFAULT_SERIALIZATION_LIMIT,
            metrics: None,
        }
    }

    /// Creates a client from the `delivery` configuration section
    pub fn from_config(config: &DeliveryConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self::with_client(client)
            .with_status_policy(config.status_policy())
            .with_serialization_limit(config.serialization_limit_bytes()))
    }

    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }

    pub fn with_serialization_limit(mut self, limit: usize) -> Self {
        self.serialization_limit = limit;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<DeliveryMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn serialization_limit(&self) -> usize {
        self.serialization_limit
    }

    /// POSTs `body` and returns the response status code
    async fn post(
        &self,
        kind: &'static str,
        endpoint: &str,
        headers: Vec<(HeaderName, HeaderValue)>,
        body: Vec<u8>,
    ) -> Result<u16, DeliveryError> {
        let url = Url::parse(endpoint)
            .map_err(|e| DeliveryError::InvalidUrl(format!("{endpoint}: {e}")))?;

        if let Some(metrics) = &self.metrics {
            metrics.observe_payload_bytes(kind, body.len());
        }

        let mut request = self.client.post(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        debug!(kind, endpoint, "Sending payload");
        let response = request.body(body).send().await?;
        Ok(response.status().as_u16())
    }

    fn finish(&self, kind: &'static str, outcome: DeliveryOutcome) -> DeliveryOutcome {
        if let Some(metrics) = &self.metrics {
            metrics.record_delivery(kind, outcome);
        }
        outcome
    }

    async fn try_deliver_session(
        &self,
        payload: &SessionPayload,
        params: &DeliveryParams,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let body = payload.to_bytes(self.serialization_limit)?;
        let headers = headers::assemble(params, None)?;
        let status = self.post("session", params.endpoint(), headers, body).await?;
        let outcome = self.status_policy.classify(status);
        debug!(status, %outcome, "Session delivery finished");
        Ok(outcome)
    }

    async fn try_deliver_event(
        &self,
        payload: &EventPayload,
        params: &DeliveryParams,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let body = payload.to_bytes(self.serialization_limit)?;
        let headers = headers::assemble(params, payload.integrity_token())?;
        let status = self.post("event", params.endpoint(), headers, body).await?;
        let outcome = self.status_policy.classify(status);
        debug!(status, %outcome, "Event delivery finished");
        Ok(outcome)
    }
}

#[async_trait]
impl Delivery for HttpDelivery {
    async fn deliver_session(
        &self,
        payload: &SessionPayload,
        params: &DeliveryParams,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        match self.try_deliver_session(payload, params).await {
            Ok(outcome) => Ok(self.finish("session", outcome)),
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_error("session");
                }
                Err(e)
            }
        }
    }

    async fn deliver_event(
        &self,
        payload: &EventPayload,
        params: &DeliveryParams,
    ) -> DeliveryOutcome {
        let outcome = match self.try_deliver_event(payload, params).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let outcome = e.event_outcome();
                warn!(
                    endpoint = params.endpoint(),
                    error = %e,
                    %outcome,
                    "Event delivery failed"
                );
                outcome
            }
        };
        self.finish("event", outcome)
    }
}

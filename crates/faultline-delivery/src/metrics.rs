//! Prometheus metrics for payload delivery
//!
//! Counts delivery outcomes per payload kind and records serialized payload
//! sizes.

use faultline_core::domain::DeliveryOutcome;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// `outcome` label of attempts that ended in an error rather than an outcome
pub const ERROR_OUTCOME: &str = "error";

/// Delivery metrics registered in their own `faultline` registry.
pub struct DeliveryMetrics {
    registry: Registry,
    /// Counter: deliveries by (kind, outcome)
    pub deliveries_total: IntCounterVec,
    /// Histogram: serialized payload size in bytes by kind
    pub payload_bytes: HistogramVec,
}

impl DeliveryMetrics {
    /// Creates a new `DeliveryMetrics` with all metrics registered.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new_custom(Some("faultline".to_string()), None)?;

        let deliveries_total = IntCounterVec::new(
            Opts::new("deliveries_total", "Total delivery attempts by outcome"),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(deliveries_total.clone()))?;

        let payload_bytes = HistogramVec::new(
            HistogramOpts::new("payload_bytes", "Serialized payload size in bytes").buckets(vec![
                1_024.0,
                16_384.0,
                131_072.0,
                1_048_576.0,
                8_388_608.0,
                f64::INFINITY,
            ]),
            &["kind"],
        )?;
        registry.register(Box::new(payload_bytes.clone()))?;

        Ok(Self {
            registry,
            deliveries_total,
            payload_bytes,
        })
    }

    // ========================================================================
    // Recording helpers
    // ========================================================================

    /// Record the outcome of one delivery attempt.
    pub fn record_delivery(&self, kind: &str, outcome: DeliveryOutcome) {
        self.deliveries_total
            .with_label_values(&[kind, outcome.as_str()])
            .inc();
    }

    /// Record an attempt that ended in a propagated error.
    pub fn record_error(&self, kind: &str) {
        self.deliveries_total
            .with_label_values(&[kind, ERROR_OUTCOME])
            .inc();
    }

    /// Observe the size of a serialized payload.
    pub fn observe_payload_bytes(&self, kind: &str, bytes: usize) {
        self.payload_bytes
            .with_label_values(&[kind])
            .observe(bytes as f64);
    }

    /// Current count for (kind, outcome).
    pub fn delivery_count(&self, kind: &str, outcome: DeliveryOutcome) -> u64 {
        self.deliveries_total
            .with_label_values(&[kind, outcome.as_str()])
            .get()
    }

    /// Current count of propagated errors for `kind`.
    pub fn error_count(&self, kind: &str) -> u64 {
        self.deliveries_total
            .with_label_values(&[kind, ERROR_OUTCOME])
            .get()
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl std::fmt::Debug for DeliveryMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryMetrics").finish_non_exhaustive()
    }
}

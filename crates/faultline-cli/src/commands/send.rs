//! Send command - Deliver a payload file to the collector
//!
//! Reads a JSON document from disk, wraps it as an event or session payload
//! and performs one delivery attempt with the configured client.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use faultline_core::{
    config::Config,
    domain::{DeliveryOutcome, DeliveryParams},
};
use faultline_delivery::{Delivery, EventPayload, HttpDelivery, SessionPayload};
use tracing::info;

use crate::output::OutputFormat;

/// Kind of payload stored in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PayloadKind {
    Event,
    Session,
}

#[derive(Debug, Args)]
pub struct SendCommand {
    /// JSON payload file
    file: PathBuf,

    /// Payload kind
    #[arg(long, value_enum, default_value_t = PayloadKind::Event)]
    kind: PayloadKind,

    /// Override the configured endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Attach a sha256 integrity token (events only)
    #[arg(long)]
    integrity: bool,
}

impl SendCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = format.formatter();
        let config = Config::load_or_default(config_path);

        let body = read_payload(&self.file).await?;
        let params = self.params(&config);
        let client =
            HttpDelivery::from_config(&config.delivery).context("Failed to build HTTP client")?;

        info!(
            file = %self.file.display(),
            kind = ?self.kind,
            endpoint = params.endpoint(),
            "Sending payload"
        );

        let outcome = match self.kind {
            PayloadKind::Event => {
                let mut payload = EventPayload::new(body);
                if self.integrity {
                    payload = payload
                        .with_computed_integrity(client.serialization_limit())
                        .context("Failed to compute integrity token")?;
                }
                client.deliver_event(&payload, &params).await
            }
            PayloadKind::Session => client
                .deliver_session(&SessionPayload::new(body), &params)
                .await
                .context("Session delivery failed")?,
        };

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "endpoint": params.endpoint(),
                "outcome": outcome,
                "disposition": outcome.disposition(),
            }));
        } else {
            match outcome {
                DeliveryOutcome::Delivered => formatter.success("Payload delivered"),
                DeliveryOutcome::Undelivered => {
                    formatter.error("Payload not delivered, keep it and retry later")
                }
                DeliveryOutcome::Failed => {
                    formatter.error("Payload rejected, retrying will not help")
                }
            }
            formatter.field("Endpoint", params.endpoint());
            formatter.field("Outcome", outcome.as_str());
            formatter.field("Disposition", &format!("{:?}", outcome.disposition()));
        }

        Ok(())
    }

    fn params(&self, config: &Config) -> DeliveryParams {
        let api_key = config.delivery.api_key.as_deref();
        match self.kind {
            PayloadKind::Event => DeliveryParams::for_event(
                self.endpoint
                    .clone()
                    .unwrap_or_else(|| config.delivery.notify_endpoint.clone()),
                api_key,
            ),
            PayloadKind::Session => DeliveryParams::for_session(
                self.endpoint
                    .clone()
                    .unwrap_or_else(|| config.delivery.sessions_endpoint.clone()),
                api_key,
            ),
        }
    }
}

async fn read_payload(path: &Path) -> Result<serde_json::Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read payload file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Payload file {} is not valid JSON", path.display()))
}

//! Config command - View and manage Faultline configuration
//!
//! Provides the `faultline config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Sets individual values via dot-notation keys
//! 3. Validates the configuration file and reports errors

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use faultline_core::{config::Config, domain::ThreadSendPolicy};
use tracing::info;

use crate::output::OutputFormat;

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "delivery.timeout_ms")
        key: String,
        /// New value
        value: String,
    },
    /// Validate the configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(format, config_path),
            ConfigCommand::Set { key, value } => {
                self.execute_set(key, value, format, config_path)
            }
            ConfigCommand::Validate => self.execute_validate(format, config_path),
        }
    }

    fn execute_show(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = format.formatter();
        let config = Config::load_or_default(config_path);

        info!(config_path = %config_path.display(), "Showing configuration");

        if format.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    fn execute_set(
        &self,
        key: &str,
        value: &str,
        format: OutputFormat,
        config_path: &Path,
    ) -> Result<()> {
        let formatter = format.formatter();
        let mut config = Config::load_or_default(config_path);

        info!(key = %key, value = %value, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "error": e.to_string(),
                }));
            } else {
                formatter.error(&format!("Failed to set '{}': {}", key, e));
                formatter.info("");
                formatter.info("Supported keys:");
                for supported in SUPPORTED_KEYS {
                    formatter.info(&format!("  {supported}"));
                }
            }
            return Err(e.context(format!("Configuration key '{key}' was not set")));
        }

        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "errors": messages,
                }));
            } else {
                formatter.error(&format!(
                    "Invalid value for '{}': {}",
                    key,
                    messages.join("; ")
                ));
            }
            anyhow::bail!(
                "Configuration key '{}' was not set: {}",
                key,
                messages.join("; ")
            );
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
        }
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
        std::fs::write(config_path, yaml).context("Failed to write configuration file")?;

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": value,
                "config_path": config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {} = {}", key, value));
            formatter.info(&format!("Saved to {}", config_path.display()));
        }

        Ok(())
    }

    fn execute_validate(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = format.formatter();

        let config = match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                let message = if config_path.exists() {
                    format!("{e:#}")
                } else {
                    "Configuration file not found, defaults are in effect".to_string()
                };
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [message],
                    }));
                } else {
                    formatter.error(&message);
                    formatter.info(&format!("File: {}", config_path.display()));
                }
                return Ok(());
            }
        };

        info!(config_path = %config_path.display(), "Validating configuration");

        let errors = config.validate();

        if format.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        Ok(())
    }
}

const SUPPORTED_KEYS: &[&str] = &[
    "launch.duration_ms                         - Launch window in ms (0 = manual)",
    "threads.send_policy                        - always|unhandled_only|never",
    "threads.project_packages                   - Comma-separated symbol prefixes",
    "threads.max_frames                         - Frames kept per thread",
    "delivery.notify_endpoint                   - Event collector URL",
    "delivery.sessions_endpoint                 - Session collector URL",
    "delivery.api_key                           - API key (empty or 'none' to clear)",
    "delivery.timeout_ms                        - Request timeout in ms",
    "delivery.drop_unrecoverable_client_errors  - true|false",
    "delivery.serialization_limit_mb            - Serialization ceiling (MiB)",
    "logging.level                              - trace|debug|info|warn|error",
];

/// Apply a dot-notation key/value pair to a Config struct
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- launch ---
        "launch.duration_ms" => {
            config.launch.duration_ms = value
                .parse::<u64>()
                .context("Expected a non-negative integer for launch.duration_ms")?;
        }

        // --- threads ---
        "threads.send_policy" => {
            config.threads.send_policy = value.parse::<ThreadSendPolicy>()?;
        }
        "threads.project_packages" => {
            config.threads.project_packages = value
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        "threads.max_frames" => {
            config.threads.max_frames = value
                .parse::<usize>()
                .context("Expected a positive integer")?;
        }

        // --- delivery ---
        "delivery.notify_endpoint" => {
            config.delivery.notify_endpoint = value.to_string();
        }
        "delivery.sessions_endpoint" => {
            config.delivery.sessions_endpoint = value.to_string();
        }
        "delivery.api_key" => {
            config.delivery.api_key = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.to_string())
            };
        }
        "delivery.timeout_ms" => {
            config.delivery.timeout_ms = value
                .parse::<u64>()
                .context("Expected a positive integer")?;
        }
        "delivery.drop_unrecoverable_client_errors" => {
            config.delivery.drop_unrecoverable_client_errors = value
                .parse::<bool>()
                .context("Expected true or false")?;
        }
        "delivery.serialization_limit_mb" => {
            config.delivery.serialization_limit_mb = value
                .parse::<u64>()
                .context("Expected a positive integer")?;
        }

        // --- logging ---
        "logging.level" => {
            config.logging.level = value.to_string();
        }

        _ => {
            anyhow::bail!("Unknown configuration key: '{}'", key);
        }
    }

    Ok(())
}

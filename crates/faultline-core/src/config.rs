//! Configuration module for Faultline.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::{StatusPolicy, ThreadSendPolicy};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Faultline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub launch: LaunchConfig,
    pub threads: ThreadsConfig,
    pub delivery: DeliveryConfig,
    pub logging: LoggingConfig,
}

/// Launch window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Length of the launch window in milliseconds. `0` means the host
    /// application ends the window itself.
    pub duration_ms: u64,
}

/// Thread snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadsConfig {
    /// Which reports carry a snapshot of all threads.
    pub send_policy: ThreadSendPolicy,
    /// Symbol prefixes that mark a frame as belonging to the application.
    pub project_packages: Vec<String>,
    /// Maximum number of frames kept per thread.
    pub max_frames: usize,
}

/// Delivery (HTTP transport) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Collector URL for event payloads.
    pub notify_endpoint: String,
    /// Collector URL for session payloads.
    pub sessions_endpoint: String,
    /// API key sent with every payload. `None` omits the header.
    pub api_key: Option<String>,
    /// Transport timeout for one request, in milliseconds.
    pub timeout_ms: u64,
    /// Treat 4xx responses (except 408 and 429) as non-recoverable.
    pub drop_unrecoverable_client_errors: bool,
    /// Memory ceiling for serializing one payload, in MiB.
    pub serialization_limit_mb: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Using default configuration");
                Self::default()
            }
        }
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/faultline/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("faultline")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default number of frames kept per thread.
pub const DEFAULT_MAX_FRAMES: usize = 200;

impl Default for LaunchConfig {
    fn default() -> Self {
        Self { duration_ms: 5000 }
    }
}

impl Default for ThreadsConfig {
    fn default() -> Self {
        Self {
            send_policy: ThreadSendPolicy::Always,
            project_packages: Vec::new(),
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            notify_endpoint: "https://notify.faultline.dev".to_string(),
            sessions_endpoint: "https://sessions.faultline.dev".to_string(),
            api_key: None,
            timeout_ms: 30_000,
            drop_unrecoverable_client_errors: false,
            serialization_limit_mb: 16,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl DeliveryConfig {
    /// Status classification configured for this transport.
    pub fn status_policy(&self) -> StatusPolicy {
        StatusPolicy::new(self.drop_unrecoverable_client_errors)
    }

    /// Serialization ceiling in bytes.
    pub fn serialization_limit_bytes(&self) -> usize {
        usize::try_from(self.serialization_limit_mb.saturating_mul(1024 * 1024))
            .unwrap_or(usize::MAX)
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"delivery.timeout_ms"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for `threads.max_frames`.
const MAX_FRAMES_LIMIT: usize = 1000;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- threads ---
        if self.threads.max_frames == 0 || self.threads.max_frames > MAX_FRAMES_LIMIT {
            errors.push(ValidationError {
                field: "threads.max_frames".into(),
                message: format!("must be in range 1..={MAX_FRAMES_LIMIT}"),
            });
        }
        if self
            .threads
            .project_packages
            .iter()
            .any(|p| p.trim().is_empty())
        {
            errors.push(ValidationError {
                field: "threads.project_packages".into(),
                message: "must not contain empty prefixes".into(),
            });
        }

        // --- delivery ---
        for (field, url) in [
            ("delivery.notify_endpoint", &self.delivery.notify_endpoint),
            ("delivery.sessions_endpoint", &self.delivery.sessions_endpoint),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(ValidationError {
                    field: field.into(),
                    message: format!("must be an http(s) URL, got '{url}'"),
                });
            }
        }
        if self.delivery.timeout_ms == 0 {
            errors.push(ValidationError {
                field: "delivery.timeout_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.delivery.serialization_limit_mb == 0 {
            errors.push(ValidationError {
                field: "delivery.serialization_limit_mb".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self
            .delivery
            .api_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            errors.push(ValidationError {
                field: "delivery.api_key".into(),
                message: "must not be empty when set".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use faultline_core::config::ConfigBuilder;
/// use faultline_core::domain::ThreadSendPolicy;
///
/// let config = ConfigBuilder::new()
///     .launch_duration_ms(0)
///     .threads_send_policy(ThreadSendPolicy::UnhandledOnly)
///     .threads_project_package("myapp::")
///     .build();
/// assert_eq!(config.launch.duration_ms, 0);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- launch ---

    pub fn launch_duration_ms(mut self, ms: u64) -> Self {
        self.config.launch.duration_ms = ms;
        self
    }

    // --- threads ---

    pub fn threads_send_policy(mut self, policy: ThreadSendPolicy) -> Self {
        self.config.threads.send_policy = policy;
        self
    }

    pub fn threads_project_package(mut self, prefix: impl Into<String>) -> Self {
        self.config.threads.project_packages.push(prefix.into());
        self
    }

    pub fn threads_max_frames(mut self, n: usize) -> Self {
        self.config.threads.max_frames = n;
        self
    }

    // --- delivery ---

    pub fn delivery_notify_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.delivery.notify_endpoint = url.into();
        self
    }

    pub fn delivery_sessions_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.delivery.sessions_endpoint = url.into();
        self
    }

    pub fn delivery_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.delivery.api_key = Some(key.into());
        self
    }

    pub fn delivery_timeout_ms(mut self, ms: u64) -> Self {
        self.config.delivery.timeout_ms = ms;
        self
    }

    pub fn delivery_drop_unrecoverable_client_errors(mut self, enabled: bool) -> Self {
        self.config.delivery.drop_unrecoverable_client_errors = enabled;
        self
    }

    pub fn delivery_serialization_limit_mb(mut self, mb: u64) -> Self {
        self.config.delivery.serialization_limit_mb = mb;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

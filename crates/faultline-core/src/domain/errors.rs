//! Domain error types
//!
//! Errors raised while parsing or validating domain values that arrive as
//! strings (configuration files, CLI flags).

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Unknown thread send policy name
    #[error("Invalid thread send policy: {0} (expected always, unhandled_only or never)")]
    InvalidSendPolicy(String),

    /// Unknown thread type tag
    #[error("Invalid thread type: {0} (expected managed or native)")]
    InvalidThreadType(String),
}

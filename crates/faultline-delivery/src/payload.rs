//! Report payloads and bounded serialization
//!
//! Payload bodies are serialized into a buffer that grows with
//! [`Vec::try_reserve`] and refuses to grow past a configured ceiling. Either
//! refusal surfaces as [`PayloadError::OutOfMemory`] instead of aborting the
//! process, which matters when the process is already in trouble.

use std::io;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Default serialization ceiling, 16 MiB
pub const DEFAULT_SERIALIZATION_LIMIT: usize = 16 * 1024 * 1024;

/// Errors produced while turning a payload into bytes
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The serialized form would not fit in memory
    #[error("Serialization ran out of memory (limit {limit} bytes)")]
    OutOfMemory {
        /// Ceiling in force when serialization stopped
        limit: usize,
    },

    /// The value cannot be represented as JSON
    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}

// ============================================================================
// Bounded serialization
// ============================================================================

struct BoundedWriter {
    buf: Vec<u8>,
    limit: usize,
    exhausted: bool,
}

impl BoundedWriter {
    fn refuse(&mut self) -> io::Error {
        self.exhausted = true;
        io::Error::new(io::ErrorKind::OutOfMemory, "serialization buffer exhausted")
    }
}

impl io::Write for BoundedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.buf.len().saturating_add(data.len()) > self.limit {
            return Err(self.refuse());
        }
        if self.buf.try_reserve(data.len()).is_err() {
            return Err(self.refuse());
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serializes `value` as JSON, failing once the output would exceed `limit`
pub fn serialize_bounded<T: Serialize + ?Sized>(
    value: &T,
    limit: usize,
) -> Result<Vec<u8>, PayloadError> {
    let mut writer = BoundedWriter {
        buf: Vec::new(),
        limit,
        exhausted: false,
    };

    match serde_json::to_writer(&mut writer, value) {
        Ok(()) => Ok(writer.buf),
        Err(_) if writer.exhausted => Err(PayloadError::OutOfMemory { limit }),
        Err(e) => Err(PayloadError::Serialize(e)),
    }
}

// ============================================================================
// Payload types
// ============================================================================

/// A session report
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPayload {
    body: Value,
}

impl SessionPayload {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn to_bytes(&self, limit: usize) -> Result<Vec<u8>, PayloadError> {
        serialize_bounded(&self.body, limit)
    }
}

/// An error report, optionally carrying an integrity token
#[derive(Debug, Clone, PartialEq)]
pub struct EventPayload {
    body: Value,
    integrity_token: Option<String>,
}

impl EventPayload {
    pub fn new(body: Value) -> Self {
        Self {
            body,
            integrity_token: None,
        }
    }

    pub fn with_integrity_token(mut self, token: impl Into<String>) -> Self {
        self.integrity_token = Some(token.into());
        self
    }

    /// Sets the integrity token to `sha256 <hex digest>` of the serialized body
    pub fn with_computed_integrity(mut self, limit: usize) -> Result<Self, PayloadError> {
        let bytes = self.to_bytes(limit)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        self.integrity_token = Some(format!("sha256 {:x}", hasher.finalize()));
        Ok(self)
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn integrity_token(&self) -> Option<&str> {
        self.integrity_token.as_deref()
    }

    pub fn to_bytes(&self, limit: usize) -> Result<Vec<u8>, PayloadError> {
        serialize_bounded(&self.body, limit)
    }
}

/// Either payload kind, for callers that dispatch at runtime
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Session(&'a SessionPayload),
    Event(&'a EventPayload),
}

impl Payload<'_> {
    /// Label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Session(_) => "session",
            Payload::Event(_) => "event",
        }
    }
}

//! Thread records embedded in error reports
//!
//! A report carries one [`Thread`] per live thread at capture time. The
//! records serialize to the collector's JSON shape:
//!
//! ```json
//! [
//!   {
//!     "id": 1,
//!     "name": "main",
//!     "type": "managed",
//!     "errorReportingThread": true,
//!     "stacktrace": [
//!       { "method": "app::run", "file": "src/main.rs", "lineNumber": 12, "inProject": true }
//!     ]
//!   }
//! ]
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// ThreadSendPolicy
// ============================================================================

/// Controls which reports include a snapshot of all live threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadSendPolicy {
    /// Capture threads for every report
    #[default]
    Always,
    /// Capture threads only for unhandled faults
    UnhandledOnly,
    /// Never capture threads
    Never,
}

impl ThreadSendPolicy {
    /// Returns true if a report with the given handledness should carry threads
    pub fn should_capture(self, is_unhandled: bool) -> bool {
        match self {
            ThreadSendPolicy::Always => true,
            ThreadSendPolicy::UnhandledOnly => is_unhandled,
            ThreadSendPolicy::Never => false,
        }
    }
}

impl fmt::Display for ThreadSendPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThreadSendPolicy::Always => "always",
            ThreadSendPolicy::UnhandledOnly => "unhandled_only",
            ThreadSendPolicy::Never => "never",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ThreadSendPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(ThreadSendPolicy::Always),
            "unhandled_only" | "unhandled-only" => Ok(ThreadSendPolicy::UnhandledOnly),
            "never" => Ok(ThreadSendPolicy::Never),
            _ => Err(DomainError::InvalidSendPolicy(s.to_string())),
        }
    }
}

// ============================================================================
// ThreadType
// ============================================================================

/// Execution environment a thread belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadType {
    /// Thread running application code under the managed runtime
    #[default]
    Managed,
    /// Thread created and driven by native code
    Native,
}

impl fmt::Display for ThreadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadType::Managed => write!(f, "managed"),
            ThreadType::Native => write!(f, "native"),
        }
    }
}

impl FromStr for ThreadType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "managed" => Ok(ThreadType::Managed),
            "native" => Ok(ThreadType::Native),
            _ => Err(DomainError::InvalidThreadType(s.to_string())),
        }
    }
}

// ============================================================================
// Stackframe / Stacktrace
// ============================================================================

/// A single frame of a serialized stack trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stackframe {
    /// Fully qualified method or symbol name
    pub method: String,
    /// Source file, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// 1-based line number, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    /// 1-based column number, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
    /// `Some(true)` when the method belongs to one of the project prefixes.
    /// Absent otherwise so framework frames stay compact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_project: Option<bool>,
}

impl Stackframe {
    /// Creates a frame with only a method name
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            file: None,
            line_number: None,
            column_number: None,
            in_project: None,
        }
    }

    /// Sets the source location
    pub fn with_location(mut self, file: impl Into<String>, line_number: Option<u32>) -> Self {
        self.file = Some(file.into());
        self.line_number = line_number;
        self
    }

    /// Marks the frame as in-project if its method matches any prefix
    pub fn classify(mut self, project_packages: &[String]) -> Self {
        self.in_project = in_project(&self.method, project_packages);
        self
    }
}

/// Returns `Some(true)` if `method` starts with one of `project_packages`.
pub fn in_project(method: &str, project_packages: &[String]) -> Option<bool> {
    if project_packages
        .iter()
        .any(|pkg| !pkg.is_empty() && method.starts_with(pkg.as_str()))
    {
        Some(true)
    } else {
        None
    }
}

/// An ordered stack trace, innermost frame first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stacktrace {
    frames: Vec<Stackframe>,
}

impl Stacktrace {
    pub fn new(frames: Vec<Stackframe>) -> Self {
        Self { frames }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Stackframe] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

// ============================================================================
// Thread
// ============================================================================

/// A single thread record in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Platform thread identifier; records are ordered by it
    pub id: u64,
    /// Thread name, if the thread has one
    pub name: Option<String>,
    /// Execution environment tag
    #[serde(rename = "type")]
    pub thread_type: ThreadType,
    /// True for the thread that faulted or requested the report
    pub error_reporting_thread: bool,
    /// Filtered stack trace at capture time
    pub stacktrace: Stacktrace,
}

impl Thread {
    pub fn new(
        id: u64,
        name: Option<String>,
        thread_type: ThreadType,
        error_reporting_thread: bool,
        stacktrace: Stacktrace,
    ) -> Self {
        Self {
            id,
            name,
            thread_type,
            error_reporting_thread,
            stacktrace,
        }
    }
}

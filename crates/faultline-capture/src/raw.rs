//! Raw, unfiltered thread data handed to the capturer
//!
//! These types describe the process as the caller sampled it at fault time.
//! Nothing here is classified or truncated yet; that is the job of
//! [`ThreadCapturer`](crate::threads::ThreadCapturer).

use faultline_core::domain::{Stackframe, ThreadType};
use thiserror::Error;

/// An unprocessed stack frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub method: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl RawFrame {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            file: None,
            line: None,
            column: None,
        }
    }

    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub(crate) fn to_stackframe(&self, project_packages: &[String]) -> Stackframe {
        Stackframe {
            method: self.method.clone(),
            file: self.file.clone(),
            line_number: self.line,
            column_number: self.column,
            in_project: None,
        }
        .classify(project_packages)
    }
}

/// A thread's stack could not be read
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot read stack of thread {thread_id}: {reason}")]
pub struct StackReadError {
    pub thread_id: u64,
    pub reason: String,
}

impl StackReadError {
    pub fn new(thread_id: u64, reason: impl Into<String>) -> Self {
        Self {
            thread_id,
            reason: reason.into(),
        }
    }
}

/// One live thread as sampled by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawThread {
    pub id: u64,
    pub name: Option<String>,
    pub thread_type: ThreadType,
    pub stack: Result<Vec<RawFrame>, StackReadError>,
}

impl RawThread {
    pub fn new(id: u64, name: Option<String>, frames: Vec<RawFrame>) -> Self {
        Self {
            id,
            name,
            thread_type: ThreadType::default(),
            stack: Ok(frames),
        }
    }

    /// A thread whose stack could not be sampled
    pub fn unreadable(id: u64, name: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            id,
            name,
            thread_type: ThreadType::default(),
            stack: Err(StackReadError::new(id, reason)),
        }
    }

    pub fn with_type(mut self, thread_type: ThreadType) -> Self {
        self.thread_type = thread_type;
        self
    }
}

/// Frames captured from the faulting error itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionTrace {
    pub frames: Vec<RawFrame>,
}

impl ExceptionTrace {
    pub fn new(frames: Vec<RawFrame>) -> Self {
        Self { frames }
    }
}

/// Every thread known at fault time plus the one reporting the fault
///
/// `current` may or may not also appear in `threads`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSnapshot {
    pub current: RawThread,
    pub threads: Vec<RawThread>,
}

impl ProcessSnapshot {
    pub fn new(current: RawThread, threads: Vec<RawThread>) -> Self {
        Self { current, threads }
    }
}

//! Thread snapshot capture
//!
//! [`ThreadCapturer`] turns a [`ProcessSnapshot`] taken at fault time into the
//! ordered list of [`Thread`] records that goes into a report.
//!
//! ## Capture steps
//!
//! 1. Decide from the [`ThreadSendPolicy`] whether to capture at all.
//! 2. Add the reporting thread if the live set does not contain it.
//! 3. For an unhandled fault, replace the reporting thread's stack with the
//!    exception's own frames.
//! 4. Order by id, truncate and classify every stack, and flag the reporting
//!    thread.
//!
//! Capture never fails as a whole: a thread whose stack cannot be read is
//! reported with an empty stack trace.

use std::collections::BTreeMap;

use faultline_core::{
    config::{ThreadsConfig, DEFAULT_MAX_FRAMES},
    domain::{Stacktrace, Thread, ThreadSendPolicy},
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::raw::{ExceptionTrace, ProcessSnapshot, RawFrame, RawThread};

// ============================================================================
// ThreadState
// ============================================================================

/// Ordered thread records of one report, serialized as a JSON array
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ThreadState {
    threads: Vec<Thread>,
}

impl ThreadState {
    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn into_threads(self) -> Vec<Thread> {
        self.threads
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// The thread flagged as reporting the fault, if any
    pub fn error_reporting_thread(&self) -> Option<&Thread> {
        self.threads.iter().find(|t| t.error_reporting_thread)
    }
}

// ============================================================================
// ThreadCapturer
// ============================================================================

/// Builds [`ThreadState`] values according to a send policy
#[derive(Debug, Clone)]
pub struct ThreadCapturer {
    policy: ThreadSendPolicy,
    project_packages: Vec<String>,
    max_frames: usize,
}

impl ThreadCapturer {
    pub fn new(policy: ThreadSendPolicy, project_packages: Vec<String>) -> Self {
        Self {
            policy,
            project_packages,
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }

    /// Caps every stack trace at `max_frames` frames, innermost kept
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn from_config(config: &ThreadsConfig) -> Self {
        Self::new(config.send_policy, config.project_packages.clone())
            .with_max_frames(config.max_frames)
    }

    pub fn policy(&self) -> ThreadSendPolicy {
        self.policy
    }

    /// Captures the threads of `snapshot`
    ///
    /// `exception` only affects the result when `is_unhandled` is true.
    pub fn capture(
        &self,
        snapshot: ProcessSnapshot,
        exception: Option<&ExceptionTrace>,
        is_unhandled: bool,
    ) -> ThreadState {
        if !self.policy.should_capture(is_unhandled) {
            debug!(policy = %self.policy, is_unhandled, "Thread capture skipped by policy");
            return ThreadState::default();
        }

        let ProcessSnapshot { current, threads } = snapshot;
        let current_id = current.id;

        let mut by_id: BTreeMap<u64, RawThread> =
            threads.into_iter().map(|t| (t.id, t)).collect();
        by_id.entry(current_id).or_insert(current);

        if is_unhandled {
            if let (Some(exception), Some(reporting)) = (exception, by_id.get_mut(&current_id)) {
                reporting.stack = Ok(exception.frames.clone());
            }
        }

        let threads: Vec<Thread> = by_id
            .into_values()
            .map(|raw| self.to_thread(raw, current_id))
            .collect();

        debug!(count = threads.len(), "Captured thread state");
        ThreadState { threads }
    }

    fn to_thread(&self, raw: RawThread, current_id: u64) -> Thread {
        let RawThread {
            id,
            name,
            thread_type,
            stack,
        } = raw;

        let stacktrace = match stack {
            Ok(frames) => self.to_stacktrace(&frames),
            Err(e) => {
                warn!(thread_id = id, error = %e, "Reporting thread with empty stack");
                Stacktrace::empty()
            }
        };

        Thread::new(id, name, thread_type, id == current_id, stacktrace)
    }

    fn to_stacktrace(&self, frames: &[RawFrame]) -> Stacktrace {
        Stacktrace::new(
            frames
                .iter()
                .take(self.max_frames)
                .map(|f| f.to_stackframe(&self.project_packages))
                .collect(),
        )
    }
}

impl Default for ThreadCapturer {
    fn default() -> Self {
        Self::new(ThreadSendPolicy::default(), Vec::new())
    }
}

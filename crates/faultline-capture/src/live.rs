//! Live stack sampling with the `backtrace` crate
//!
//! Helpers for callers that want to build a [`ProcessSnapshot`] or an
//! [`ExceptionTrace`] from the running process, e.g. inside a panic hook.
//! Only the calling thread can be sampled portably; other threads have to be
//! supplied by the embedding runtime.

use std::sync::atomic::{AtomicU64, Ordering};

use backtrace::{Backtrace, BacktraceSymbol};

use crate::raw::{ExceptionTrace, ProcessSnapshot, RawFrame, RawThread};

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Frames from these paths are sampling machinery, not caller code
const SAMPLER_PREFIXES: &[&str] = &["backtrace::", "faultline_capture::live::"];

/// Process-local id of the calling thread
///
/// Ids are assigned on first use, start at 1 and are never reused while the
/// process lives.
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

fn raw_frame(symbol: &BacktraceSymbol) -> Option<RawFrame> {
    let name = symbol.name()?;
    Some(RawFrame {
        method: format!("{name:#}"),
        file: symbol.filename().map(|p| p.display().to_string()),
        line: symbol.lineno(),
        column: symbol.colno(),
    })
}

fn strip_sampler_frames(mut frames: Vec<RawFrame>) -> Vec<RawFrame> {
    let skip = frames
        .iter()
        .take_while(|f| SAMPLER_PREFIXES.iter().any(|p| f.method.starts_with(p)))
        .count();
    frames.drain(..skip);
    frames
}

fn sample_frames() -> Vec<RawFrame> {
    ExceptionTrace::from_backtrace(&Backtrace::new()).frames
}

impl RawThread {
    /// Samples the calling thread
    pub fn current() -> Self {
        let name = std::thread::current().name().map(str::to_string);
        RawThread::new(current_thread_id(), name, sample_frames())
    }
}

impl ExceptionTrace {
    /// Captures the calling thread's stack as the faulting error's trace
    pub fn capture() -> Self {
        Self::new(sample_frames())
    }

    /// Converts an already captured backtrace. An unresolved backtrace has no
    /// symbols and yields an empty trace.
    pub fn from_backtrace(backtrace: &Backtrace) -> Self {
        let frames = backtrace
            .frames()
            .iter()
            .flat_map(|frame| frame.symbols())
            .filter_map(raw_frame)
            .collect();
        Self::new(strip_sampler_frames(frames))
    }
}

impl ProcessSnapshot {
    /// A snapshot that only knows the calling thread
    pub fn current_thread_only() -> Self {
        Self::new(RawThread::current(), Vec::new())
    }
}

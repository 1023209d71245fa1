//! Faultline Capture - What the process looked like when it faulted
//!
//! Provides:
//! - Launch window tracking with a one-shot deferred completion
//! - Policy-driven thread snapshot capture
//! - Live stack sampling of the calling thread
//!
//! ## Modules
//!
//! - [`launch`] - `LaunchTracker`, the "still starting up?" flag
//! - [`scheduler`] - `OneShotScheduler`, the timer behind the launch window
//! - [`threads`] - `ThreadCapturer` and the resulting `ThreadState`
//! - [`raw`] - unfiltered thread and frame data supplied by the caller
//! - [`live`] - sampling helpers built on the `backtrace` crate

pub mod launch;
pub mod live;
pub mod raw;
pub mod scheduler;
pub mod threads;

pub use launch::LaunchTracker;
pub use live::current_thread_id;
pub use raw::{ExceptionTrace, ProcessSnapshot, RawFrame, RawThread, StackReadError};
pub use scheduler::{OneShotScheduler, ScheduleError};
pub use threads::{ThreadCapturer, ThreadState};

//! One-shot deferred task facility
//!
//! [`OneShotScheduler`] runs a closure once after a delay on a tokio runtime.
//! It uses the caller's runtime when there is one and otherwise owns a
//! single-worker runtime of its own, so synchronous hosts get working timers
//! too. It can be shut down exactly once; after that every pending task is
//! cancelled and new [`schedule`](OneShotScheduler::schedule) calls are
//! rejected instead of being queued.
//!
//! ```text
//! schedule(delay, task) ──→ spawn ──→ select! { cancelled ──→ drop task
//!                                              sleep(delay) ──→ task() }
//! shutdown() ──→ CancellationToken::cancel()
//! drop ──→ shutdown() + owned runtime shut down in the background
//! ```

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use thiserror::Error;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Worker thread name of a scheduler-owned runtime
const TIMER_THREAD_NAME: &str = "faultline-timer";

/// Reasons a deferred task could not be scheduled
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// The scheduler has been shut down
    #[error("scheduler has been shut down, task rejected")]
    Rejected,

    /// The scheduler could not create a runtime to run its tasks on
    #[error("no tokio runtime available to run the deferred task")]
    NoRuntime,
}

/// Runs closures once after a delay, until shut down
#[derive(Debug)]
pub struct OneShotScheduler {
    /// Runtime the deferred tasks are spawned on
    handle: Option<Handle>,
    /// Runtime created by this scheduler, shut down on drop
    owned: Option<Runtime>,
    /// Set once by `shutdown()`
    shut_down: AtomicBool,
    /// Cancels every task spawned by this scheduler
    cancel: CancellationToken,
}

impl OneShotScheduler {
    fn build(handle: Option<Handle>, owned: Option<Runtime>) -> Self {
        Self {
            handle,
            owned,
            shut_down: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a scheduler that spawns its tasks on `handle`
    pub fn new(handle: Handle) -> Self {
        Self::build(Some(handle), None)
    }

    /// Creates a scheduler backed by its own single-worker runtime
    ///
    /// If the runtime cannot be created the failure is logged and every
    /// task is rejected with [`ScheduleError::NoRuntime`].
    pub fn owned() -> Self {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(TIMER_THREAD_NAME)
            .enable_time()
            .build();

        match runtime {
            Ok(runtime) => {
                let handle = runtime.handle().clone();
                Self::build(Some(handle), Some(runtime))
            }
            Err(e) => {
                warn!(error = %e, "Failed to create timer runtime");
                Self::build(None, None)
            }
        }
    }

    /// A scheduler with no runtime, for owners that never schedule
    pub(crate) fn idle() -> Self {
        Self::build(None, None)
    }

    /// Uses the runtime of the calling context, or an owned one outside of it
    pub fn current() -> Self {
        match Handle::try_current() {
            Ok(handle) => Self::new(handle),
            Err(_) => Self::owned(),
        }
    }

    /// Returns true when the tasks run on a runtime owned by this scheduler
    pub fn owns_runtime(&self) -> bool {
        self.owned.is_some()
    }

    /// Runs `task` once after `delay`
    ///
    /// # Errors
    /// - [`ScheduleError::Rejected`] after [`shutdown`](Self::shutdown)
    /// - [`ScheduleError::NoRuntime`] if no runtime could be created
    pub fn schedule<F>(&self, delay: Duration, task: F) -> Result<(), ScheduleError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_shutdown() {
            return Err(ScheduleError::Rejected);
        }
        let handle = self.handle.as_ref().ok_or(ScheduleError::NoRuntime)?;
        let cancel = self.cancel.clone();

        handle.spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Deferred task cancelled before it fired");
                }
                _ = tokio::time::sleep(delay) => {
                    task();
                }
            }
        });

        debug!(delay_ms = delay.as_millis() as u64, "Deferred task scheduled");
        Ok(())
    }

    /// Cancels pending tasks and rejects future ones. Idempotent.
    pub fn shutdown(&self) {
        if !self.shut_down.swap(true, Ordering::AcqRel) {
            self.cancel.cancel();
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}

impl Drop for OneShotScheduler {
    fn drop(&mut self) {
        self.shutdown();
        // may run inside an async context, so never block on the workers
        if let Some(runtime) = self.owned.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_task_fires_after_delay() {
        let scheduler = OneShotScheduler::current();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        scheduler
            .schedule(Duration::from_millis(100), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_task() {
        let scheduler = OneShotScheduler::current();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        scheduler
            .schedule(Duration::from_millis(100), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        scheduler.shutdown();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_shutdown());
    }

    #[tokio::test]
    async fn test_schedule_after_shutdown_is_rejected() {
        let scheduler = OneShotScheduler::current();
        scheduler.shutdown();
        scheduler.shutdown();

        let result = scheduler.schedule(Duration::from_millis(1), || {});
        assert_eq!(result, Err(ScheduleError::Rejected));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_task() {
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let scheduler = OneShotScheduler::current();
            let counter = fired.clone();
            scheduler
                .schedule(Duration::from_millis(10), move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    fn wait_for(fired: &AtomicUsize, expected: usize) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while fired.load(Ordering::SeqCst) != expected && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_owned_runtime_fires_without_ambient_runtime() {
        let scheduler = OneShotScheduler::current();
        assert!(scheduler.owns_runtime());

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        scheduler
            .schedule(Duration::from_millis(10), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        wait_for(&fired, 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_owned_runtime_drop_cancels_pending_task() {
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let scheduler = OneShotScheduler::owned();
            let counter = fired.clone();
            scheduler
                .schedule(Duration::from_millis(50), move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_owned_runtime_rejects_after_shutdown() {
        let scheduler = OneShotScheduler::owned();
        scheduler.shutdown();

        let result = scheduler.schedule(Duration::from_millis(1), || {});
        assert_eq!(result, Err(ScheduleError::Rejected));
    }

    #[tokio::test]
    async fn test_ambient_runtime_preferred_and_owned_drop_in_async_context() {
        assert!(!OneShotScheduler::current().owns_runtime());

        let owned = OneShotScheduler::owned();
        assert!(owned.owns_runtime());
        drop(owned);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ScheduleError::Rejected.to_string(),
            "scheduler has been shut down, task rejected"
        );
    }
}

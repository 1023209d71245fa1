//! Launch window tracking
//!
//! A [`LaunchTracker`] answers "is the application still starting up?". The
//! window opens when the tracker is created and closes either after the
//! configured duration or when [`LaunchTracker::mark_launch_completed`] is
//! called, whichever happens first. Once closed it never reopens.
//!
//! ## Design Notes
//!
//! - The flag is an [`AtomicBool`] so fault handlers on any thread can read it
//!   without locking.
//! - The deferred completion holds a [`Weak`] reference, so a pending timer
//!   never keeps a dropped tracker alive.
//! - Observers receive [`StateEvent::UpdateIsLaunching`]`(false)` once, on the
//!   thread that performed the transition.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use faultline_core::{config::LaunchConfig, ObserverBus, ObserverId, StateEvent};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::scheduler::OneShotScheduler;

/// Shared state between the tracker and its deferred completion task
#[derive(Debug)]
struct LaunchState {
    launching: AtomicBool,
    scheduler: OneShotScheduler,
    observers: ObserverBus<StateEvent>,
}

impl LaunchState {
    fn complete(&self) {
        self.scheduler.shutdown();
        if self.launching.swap(false, Ordering::AcqRel) {
            debug!("App launch period marked as complete");
            self.observers.notify(&StateEvent::UpdateIsLaunching(false));
        }
    }
}

/// Tracks whether the application is inside its launch window
#[derive(Debug)]
pub struct LaunchTracker {
    state: Arc<LaunchState>,
}

impl LaunchTracker {
    /// Creates a tracker whose timer runs on the ambient tokio runtime, or on
    /// a runtime owned by the tracker when called outside of one.
    ///
    /// With `launch_duration_ms == 0` the window only closes through
    /// [`mark_launch_completed`](Self::mark_launch_completed).
    pub fn new(launch_duration_ms: u64) -> Self {
        let scheduler = if launch_duration_ms > 0 {
            OneShotScheduler::current()
        } else {
            OneShotScheduler::idle()
        };
        Self::build(launch_duration_ms, scheduler)
    }

    /// Creates a tracker whose timer runs on `handle`
    pub fn with_handle(launch_duration_ms: u64, handle: Handle) -> Self {
        Self::build(launch_duration_ms, OneShotScheduler::new(handle))
    }

    pub fn from_config(config: &LaunchConfig) -> Self {
        Self::new(config.duration_ms)
    }

    fn build(launch_duration_ms: u64, scheduler: OneShotScheduler) -> Self {
        let state = Arc::new(LaunchState {
            launching: AtomicBool::new(true),
            scheduler,
            observers: ObserverBus::new(),
        });

        if launch_duration_ms > 0 {
            let weak: Weak<LaunchState> = Arc::downgrade(&state);
            let scheduled = state
                .scheduler
                .schedule(Duration::from_millis(launch_duration_ms), move || {
                    if let Some(state) = weak.upgrade() {
                        state.complete();
                    }
                });

            if let Err(e) = scheduled {
                warn!(
                    error = %e,
                    launch_duration_ms,
                    "Failed to schedule launch completion, window stays open until completed manually"
                );
            }
        }

        Self { state }
    }

    /// Closes the launch window
    ///
    /// Stops the timer permanently. Observers are notified only on the call
    /// that actually flips the flag; later calls are no-ops apart from the
    /// (already idempotent) timer shutdown.
    pub fn mark_launch_completed(&self) {
        self.state.complete();
    }

    /// Returns true while the application is inside its launch window
    pub fn is_launching(&self) -> bool {
        self.state.launching.load(Ordering::Acquire)
    }

    pub fn add_observer<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&StateEvent) + Send + Sync + 'static,
    {
        self.state.observers.add_observer(observer)
    }

    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.state.observers.remove_observer(id)
    }
}

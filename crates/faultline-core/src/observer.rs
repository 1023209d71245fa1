//! Synchronous observer bus
//!
//! A publishing component owns an [`ObserverBus`] and calls
//! [`notify`](ObserverBus::notify) whenever its observable state changes.
//! Observers run on the publishing thread, in registration order.
//!
//! ## Design Notes
//!
//! - The observer list is cloned before dispatch, so an observer may add or
//!   remove observers (including itself) from inside its callback.
//! - A panicking observer poisons nothing: the lock is only held while the
//!   list is copied or edited.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use serde::{Deserialize, Serialize};

/// State changes published by the capture core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateEvent {
    /// The launching flag changed to the given value
    UpdateIsLaunching(bool),
}

/// Identity of a registered observer, used for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// One-to-many, in-order, synchronous notification of events of type `E`
pub struct ObserverBus<E> {
    observers: RwLock<Vec<(ObserverId, Callback<E>)>>,
    next_id: AtomicU64,
}

impl<E> ObserverBus<E> {
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers an observer and returns its identity
    pub fn add_observer<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.write().push((id, Arc::new(observer)));
        id
    }

    /// Removes an observer. Returns false if `id` was not registered.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.write();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// Delivers `event` to every observer registered at the time of the call
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Callback<E>> = self.read().iter().map(|(_, cb)| cb.clone()).collect();
        for observer in snapshot {
            observer(event);
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<(ObserverId, Callback<E>)>> {
        self.observers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<(ObserverId, Callback<E>)>> {
        self.observers.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl<E> Default for ObserverBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for ObserverBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverBus")
            .field("observers", &self.len())
            .finish()
    }
}

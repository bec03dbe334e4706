//! Shared application state and the global allocator.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nodewatch_core::collector::Collector;
use nodewatch_core::registry::Registry;
use nodewatch_core::storage::{ObservationStore, RetentionPolicy};

pub(crate) type SharedStore = Arc<Mutex<Box<dyn ObservationStore>>>;

/// Everything a handler needs. Cloned per request; all fields are shared.
#[derive(Clone)]
pub(crate) struct AppState {
    /// Built once in `main`, never mutated.
    pub(crate) registry: Arc<Registry>,
    pub(crate) collector: Arc<Collector>,
    pub(crate) store: SharedStore,
    pub(crate) retention: RetentionPolicy,
}

impl AppState {
    pub(crate) fn new(
        registry: Registry,
        collector: Collector,
        store: Box<dyn ObservationStore>,
        retention: RetentionPolicy,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            collector: Arc::new(collector),
            store: Arc::new(Mutex::new(store)),
            retention,
        }
    }

    /// Locks the store. A panic in another handler does not leave the
    /// table half-written, so a poisoned lock is still usable.
    pub(crate) fn lock_store(&self) -> MutexGuard<'_, Box<dyn ObservationStore>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

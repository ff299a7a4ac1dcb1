use std::sync::Arc;

use skyreport_core::Fragment;
use tokio::sync::{Mutex, MutexGuard};

use crate::traits::{StagedFragment, StagingResult, StagingStore};

/// The staging area: an injected store plus the cycle lock.
///
/// The store is shared mutable state across all in-flight requests, so a
/// generate-report cycle must observe a consistent fragment set: the listing
/// at cycle start and the unconditional clear at cycle end are one critical
/// section. [`StagingArea::begin_cycle`] hands out a guard that holds the
/// lock for the whole cycle; uploads take the same lock per append.
pub struct StagingArea {
    store: Arc<dyn StagingStore>,
    cycle_lock: Mutex<()>,
}

impl StagingArea {
    pub fn new(store: Arc<dyn StagingStore>) -> Self {
        Self {
            store,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Stage one uploaded fragment, returning its sequence number.
    /// Blocks while a generate cycle holds the staging area.
    pub async fn add(&self, fragment: &Fragment) -> StagingResult<u64> {
        let _guard = self.cycle_lock.lock().await;
        self.store.append(fragment).await
    }

    /// Acquire the staging area for one generate-report cycle.
    pub async fn begin_cycle(&self) -> CycleGuard<'_> {
        CycleGuard {
            _guard: self.cycle_lock.lock().await,
            store: &self.store,
        }
    }
}

/// Exclusive access to the staging area for the duration of one cycle.
pub struct CycleGuard<'a> {
    _guard: MutexGuard<'a, ()>,
    store: &'a Arc<dyn StagingStore>,
}

impl CycleGuard<'_> {
    /// List staged fragments in arrival order.
    pub async fn list(&self) -> StagingResult<Vec<StagedFragment>> {
        self.store.list().await
    }

    /// Number of staged fragments, without materializing them.
    pub async fn len(&self) -> StagingResult<usize> {
        self.store.len().await
    }

    /// Empty the staging area. Called on every cycle exit path.
    pub async fn clear(&self) -> StagingResult<()> {
        self.store.clear().await
    }
}

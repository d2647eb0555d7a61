//! Concurrency gate: caps simultaneously running work

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

/// Fixed-capacity permit pool; a permit goes back when its holder drops it
#[derive(Clone)]
pub struct InflightGate {
    permits: Arc<Semaphore>,
    capacity: usize,
    peak: Arc<AtomicUsize>,
}

/// Held by one running work item; dropping it frees the slot
#[derive(Debug)]
pub struct InflightPermit {
    _permit: OwnedSemaphorePermit,
}

impl InflightGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a free slot
    pub async fn acquire(&self) -> InflightPermit {
        trace!(in_flight = self.in_flight(), "InflightGate::acquire: called");
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .expect("inflight semaphore is never closed");
        self.peak.fetch_max(self.in_flight(), Ordering::Relaxed);
        InflightPermit { _permit: permit }
    }

    /// Permits currently held
    pub fn in_flight(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    /// Highest number of permits held at once
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

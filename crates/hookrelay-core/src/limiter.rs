//! Bound on concurrently running forwards.
//!
//! Each forward holds a permit for its whole lifetime. When every permit is
//! taken, [`InFlightLimiter::acquire`] waits, which in turn stalls the frame
//! reader until a forward finishes.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting limiter shared between the reader and spawned forwards.
#[derive(Debug, Clone)]
pub struct InFlightLimiter {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl InFlightLimiter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot. The slot is released when the permit drops.
    ///
    /// The semaphore is private and never closed, so this only yields `None`
    /// if that changes; callers then forward without holding a slot.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.permits).acquire_owned().await.ok()
    }

    /// Number of forwards currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }
}

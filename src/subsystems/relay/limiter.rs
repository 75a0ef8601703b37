//! Bounded in-flight limiter for completion exchanges.

use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

use crate::config::OverflowPolicy;

/// Caps how many completion exchanges run at once.
///
/// A permit is held for the whole exchange (completion + reply) and released
/// on drop. Clone freely — clones share the same semaphore.
#[derive(Debug, Clone)]
pub struct InFlightLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl InFlightLimiter {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self { semaphore: Arc::new(Semaphore::new(capacity)), capacity, policy }
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Exchanges currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// Take a permit only if one is free right now.
    pub fn try_admit(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().try_acquire_owned().ok()
    }

    /// Wait for a permit. Fails only if the semaphore was closed.
    pub async fn admit(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.semaphore.clone().acquire_owned().await
    }
}

//! Rate gate: a permit pool refilled on a fixed clock

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

use super::config::{MIN_TICK, RefillPolicy};

/// Admits at most `rate` launches per second after an initial burst of up
/// to `capacity`.
///
/// Permits taken by [`RateGate::acquire`] are consumed, not returned; only
/// the refill clock puts them back.
pub struct RateGate {
    permits: Arc<Semaphore>,
    capacity: usize,
    policy: RefillPolicy,
    refill_task: Option<JoinHandle<()>>,
}

impl RateGate {
    /// Create a full gate without a refill clock
    pub fn new(capacity: usize, policy: RefillPolicy) -> Self {
        debug!(capacity, %policy, "RateGate::new: called");
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            policy,
            refill_task: None,
        }
    }

    /// Create a full gate and start refilling it every `period`
    pub fn start(capacity: usize, policy: RefillPolicy, period: Duration) -> Self {
        let period = period.max(MIN_TICK);
        let mut gate = Self::new(capacity, policy);
        let permits = Arc::clone(&gate.permits);
        let capacity = gate.capacity;

        gate.refill_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                refill(&permits, capacity, policy);
            }
        }));

        gate
    }

    /// Wait for and consume one permit
    pub async fn acquire(&self) {
        trace!(available = self.available(), "RateGate::acquire: called");
        self.permits
            .acquire()
            .await
            .expect("rate semaphore is never closed")
            .forget();
    }

    /// Apply one refill tick
    pub fn refill(&self) -> usize {
        refill(&self.permits, self.capacity, self.policy)
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> RefillPolicy {
        self.policy
    }
}

impl Drop for RateGate {
    fn drop(&mut self) {
        if let Some(task) = self.refill_task.take() {
            task.abort();
        }
    }
}

/// Returns the number of permits added.
///
/// Only the refill clock adds permits and acquirers only remove them, so the
/// count read here can only grow stale downwards and the pool never exceeds
/// `capacity`.
fn refill(permits: &Semaphore, capacity: usize, policy: RefillPolicy) -> usize {
    let missing = capacity.saturating_sub(permits.available_permits());
    let added = match policy {
        RefillPolicy::TopUp => missing,
        RefillPolicy::TokenBucket => missing.min(1),
    };
    if added > 0 {
        permits.add_permits(added);
        trace!(added, "refill: permits restored");
    }
    added
}

//! Completion tracker: join barrier over dispatched work

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error};

use crate::error::ExecError;

/// Tracks every dispatched unit until it has been joined
#[derive(Default)]
pub struct CompletionTracker {
    tasks: JoinSet<Result<(), ExecError>>,
    failed: Arc<AtomicBool>,
    registered: u64,
    completed: u64,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit and start running it
    ///
    /// `guard` lives until the unit has finished and a failure has been
    /// flagged, so whoever observes the guard's release also observes
    /// [`CompletionTracker::has_failed`]. It is dropped on panic and abort too.
    pub fn dispatch<G, F>(&mut self, guard: G, unit: F)
    where
        G: Send + 'static,
        F: Future<Output = Result<(), ExecError>> + Send + 'static,
    {
        self.registered += 1;
        let failed = Arc::clone(&self.failed);
        self.tasks.spawn(async move {
            let result = unit.await;
            if result.is_err() {
                failed.store(true, Ordering::Release);
            }
            drop(guard);
            result
        });
    }

    /// Whether any finished unit has failed, joined or not
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Reap the next finished unit, or `None` when nothing is outstanding
    pub async fn join_next(&mut self) -> Option<Result<(), ExecError>> {
        let joined = self.tasks.join_next().await?;
        self.completed += 1;
        Some(joined.unwrap_or_else(|e| Err(join_failure(e))))
    }

    /// Wait for every outstanding unit
    ///
    /// The first failure aborts the remaining units and is returned once they
    /// have been torn down.
    pub async fn wait_all(&mut self) -> Result<(), ExecError> {
        debug!(outstanding = self.outstanding(), "CompletionTracker::wait_all: called");
        while let Some(result) = self.join_next().await {
            if let Err(e) = result {
                self.abort_all().await;
                return Err(e);
            }
        }
        debug!(completed = self.completed, "CompletionTracker::wait_all: all units joined");
        Ok(())
    }

    /// Cancel every outstanding unit and wait for them to stop
    pub async fn abort_all(&mut self) {
        let outstanding = self.outstanding();
        if outstanding > 0 {
            debug!(outstanding, "CompletionTracker::abort_all: aborting in-flight units");
        }
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {
            self.completed += 1;
        }
    }

    pub fn registered(&self) -> u64 {
        self.registered
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }
}

fn join_failure(e: JoinError) -> ExecError {
    error!(error = %e, "execution task did not complete");
    if e.is_panic() {
        let payload = e.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        ExecError::Panicked(message)
    } else {
        ExecError::Panicked("task cancelled".to_string())
    }
}

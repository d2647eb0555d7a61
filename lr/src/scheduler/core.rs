//! Scheduler loop: admits work lines through both gates

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::error::ExecError;
use crate::executor::Executor;
use crate::source::LineSource;
use crate::template::CommandTemplate;

use super::config::SchedulerConfig;
use super::inflight::InflightGate;
use super::rate::RateGate;
use super::tracker::CompletionTracker;

/// Totals for a finished run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub admitted: u64,
    pub completed: u64,
    pub peak_in_flight: usize,
    pub elapsed: Duration,
}

/// Drives work lines through the rate and concurrency gates
///
/// Admission happens strictly in input order; completion order is not
/// constrained. The first failed execution stops admission, aborts every
/// in-flight unit and is returned from [`Scheduler::run`].
pub struct Scheduler {
    config: SchedulerConfig,
    template: CommandTemplate,
    rate: RateGate,
    inflight: InflightGate,
}

impl Scheduler {
    /// Create a scheduler and start the rate gate's refill clock
    pub fn new(config: SchedulerConfig, template: CommandTemplate) -> Self {
        debug!(?config, %template, "Scheduler::new: called");
        let rate = RateGate::start(config.capacity(), config.refill, config.tick_interval());
        Self::with_gates(config, template, rate)
    }

    /// Create a scheduler around an existing rate gate
    pub fn with_gates(config: SchedulerConfig, template: CommandTemplate, rate: RateGate) -> Self {
        let inflight = InflightGate::new(config.capacity());
        Self {
            config,
            template,
            rate,
            inflight,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn rate_gate(&self) -> &RateGate {
        &self.rate
    }

    pub fn inflight_gate(&self) -> &InflightGate {
        &self.inflight
    }

    /// Admit every line from `source` and wait for all admitted work
    pub async fn run<E>(&self, mut source: LineSource, executor: Arc<E>) -> Result<RunSummary, ExecError>
    where
        E: Executor + 'static,
    {
        info!(
            command = %self.template,
            rate = self.config.rate,
            inflight = self.config.inflight,
            refill = %self.config.refill,
            "Scheduler::run: starting"
        );
        let started = Instant::now();
        let mut tracker = CompletionTracker::new();

        let admitted = self.admit_all(&mut source, &executor, &mut tracker).await;
        let outcome = match admitted {
            Ok(()) => tracker.wait_all().await,
            Err(e) => {
                tracker.abort_all().await;
                Err(e)
            }
        };

        let summary = RunSummary {
            admitted: tracker.registered(),
            completed: tracker.completed(),
            peak_in_flight: self.inflight.peak(),
            elapsed: started.elapsed(),
        };

        match outcome {
            Ok(()) => {
                let stats = source.finish().await;
                info!(?summary, input_errors = stats.errors, "Scheduler::run: finished");
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, ?summary, "Scheduler::run: aborted after execution failure");
                Err(e)
            }
        }
    }

    async fn admit_all<E>(
        &self,
        source: &mut LineSource,
        executor: &Arc<E>,
        tracker: &mut CompletionTracker,
    ) -> Result<(), ExecError>
    where
        E: Executor + 'static,
    {
        while let Some(line) = until_failure(tracker, source.next_line()).await? {
            let item = self.template.render(line);

            let permit = until_failure(tracker, self.inflight.acquire()).await?;
            until_failure(tracker, self.rate.acquire()).await?;

            // A unit that failed before releasing its slot is still unjoined.
            if tracker.has_failed() {
                debug!("Scheduler::admit_all: failure observed, stopping admission");
                return Ok(());
            }

            debug!(command = %item, in_flight = self.inflight.in_flight(), "Scheduler::admit_all: admitting");
            let executor = Arc::clone(executor);
            tracker.dispatch(permit, async move { executor.execute(item).await });
        }

        debug!(admitted = tracker.registered(), "Scheduler::admit_all: input exhausted");
        Ok(())
    }
}

/// Await `step` while reaping finished units; a failed unit wins the race
async fn until_failure<F>(tracker: &mut CompletionTracker, step: F) -> Result<F::Output, ExecError>
where
    F: Future,
{
    tokio::pin!(step);
    loop {
        tokio::select! {
            biased;
            Some(done) = tracker.join_next() => done?,
            output = &mut step => return Ok(output),
        }
    }
}

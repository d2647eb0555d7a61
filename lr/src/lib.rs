//! Linerate - rate-limited command launcher
//!
//! Reads lines from an input stream and launches one external command per
//! line, with every `{}` in the command's arguments replaced by the line.
//! Launches are throttled by two independent limits:
//!
//! - **Rate**: at most `rate` launches per second after an initial burst
//! - **In-flight**: at most `inflight` commands running at once
//!
//! The first failing command ends the run.
//!
//! # Modules
//!
//! - [`scheduler`] - Rate gate, concurrency gate, completion tracking and the admission loop
//! - [`source`] - Lazy line reader over the input stream
//! - [`executor`] - Executor trait and child-process implementation
//! - [`template`] - Command templates and placeholder substitution
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod scheduler;
pub mod source;
pub mod template;

// Re-export commonly used types
pub use config::{Config, RunConfig};
pub use error::{ConfigError, ExecError, InputError};
pub use executor::{Executor, ProcessExecutor};
pub use scheduler::{
    CompletionTracker, InflightGate, InflightPermit, RateGate, RefillPolicy, RunSummary, Scheduler, SchedulerConfig,
};
pub use source::{LineSource, ReadStats, ensure_redirected};
pub use template::{CommandTemplate, PLACEHOLDER, WorkItem};

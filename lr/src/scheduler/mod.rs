//! Scheduler for command launches
//!
//! Admits work lines under two independent limits: a launch rate enforced
//! by a periodically refilled [`RateGate`], and a cap on running commands
//! enforced by an [`InflightGate`]. Dispatched work is joined through a
//! [`CompletionTracker`].

mod config;
mod core;
mod inflight;
mod rate;
mod tracker;

pub use config::{RefillPolicy, SchedulerConfig};
pub use core::{RunSummary, Scheduler};
pub use inflight::{InflightGate, InflightPermit};
pub use rate::RateGate;
pub use tracker::CompletionTracker;

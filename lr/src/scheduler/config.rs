//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Shortest refill period; the interval timer rejects a zero period
pub const MIN_TICK: Duration = Duration::from_nanos(1);

/// How the rate gate refills on each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RefillPolicy {
    /// Restore every missing permit, up to capacity
    #[default]
    TopUp,
    /// Add a single permit, never beyond capacity
    TokenBucket,
}

impl std::fmt::Display for RefillPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TopUp => write!(f, "top-up"),
            Self::TokenBucket => write!(f, "token-bucket"),
        }
    }
}

impl std::str::FromStr for RefillPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top-up" | "topup" => Ok(Self::TopUp),
            "token-bucket" | "bucket" => Ok(Self::TokenBucket),
            _ => Err(format!("Unknown refill policy: {}. Use: top-up or token-bucket", s)),
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Launches per second
    #[serde(default = "default_rate")]
    pub rate: u32,

    /// Max simultaneously running commands
    #[serde(default = "default_inflight")]
    pub inflight: u32,

    /// Rate gate refill policy
    #[serde(default)]
    pub refill: RefillPolicy,
}

fn default_rate() -> u32 {
    1
}

fn default_inflight() -> u32 {
    1
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            rate: default_rate(),
            inflight: default_inflight(),
            refill: RefillPolicy::default(),
        }
    }
}

impl SchedulerConfig {
    /// Reject limits that would stall or divide by zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate == 0 {
            return Err(ConfigError::InvalidRate(self.rate));
        }
        if self.inflight == 0 {
            return Err(ConfigError::InvalidInflight(self.inflight));
        }
        Ok(())
    }

    /// Period of the rate gate refill clock
    ///
    /// Rates above one per nanosecond tick as fast as the timer allows.
    pub fn tick_interval(&self) -> Duration {
        (Duration::from_secs(1) / self.rate.max(1)).max(MIN_TICK)
    }

    /// Capacity of both gates
    pub fn capacity(&self) -> usize {
        self.inflight.max(1) as usize
    }
}

//! Linerate configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::scheduler::{RefillPolicy, SchedulerConfig};
use crate::template::CommandTemplate;

/// Optional file configuration; CLI flags override every field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Launches per second
    pub rate: Option<u32>,

    /// Max simultaneously running commands
    pub inflight: Option<u32>,

    /// Rate gate refill policy
    pub refill: Option<RefillPolicy>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // An explicit path must load
        if let Some(path) = config_path {
            return Self::load_from_file(path).map_err(|e| {
                ConfigError::Load {
                    path: path.clone(),
                    message: format!("{:#}", e),
                }
                .into()
            });
        }

        // Try project-local config: .linerate.yml
        let local_config = PathBuf::from(".linerate.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/linerate/linerate.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("linerate").join("linerate.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub scheduler: SchedulerConfig,
    pub template: CommandTemplate,
}

impl RunConfig {
    /// Merge CLI flags over file config over defaults
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self, ConfigError> {
        let defaults = SchedulerConfig::default();
        let scheduler = SchedulerConfig {
            rate: cli.rate.or(config.rate).unwrap_or(defaults.rate),
            inflight: cli.inflight.or(config.inflight).unwrap_or(defaults.inflight),
            refill: cli.refill.or(config.refill).unwrap_or(defaults.refill),
        };
        scheduler.validate()?;

        let template = CommandTemplate::from_argv(cli.command.clone())?;
        Ok(Self { scheduler, template })
    }
}

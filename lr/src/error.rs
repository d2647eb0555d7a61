//! Error types for configuration, input and command execution

use std::path::PathBuf;
use thiserror::Error;

/// Errors detected before any work starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("command to launch is not specified")]
    MissingCommand,

    #[error("input must be piped or redirected, refusing to read from a terminal")]
    InteractiveInput,

    #[error("rate must be at least 1 launch per second, got {0}")]
    InvalidRate(u32),

    #[error("inflight must be at least 1, got {0}")]
    InvalidInflight(u32),

    #[error("Failed to load config from {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },
}

/// Errors reading a line from the input stream (non-fatal)
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from running a work item (fatal to the whole run)
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {}", describe_exit(.code))]
    Failed { command: String, code: Option<i32> },

    #[error("execution task panicked: {0}")]
    Panicked(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

impl ExecError {
    /// Exit code of the failed command, if it ran and exited normally
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::Failed { code, .. } => *code,
            _ => None,
        }
    }
}

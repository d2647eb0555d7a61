//! Launching the external command for a work item

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error};

use crate::error::ExecError;
use crate::template::WorkItem;

/// Runs one work item to completion
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, item: WorkItem) -> Result<(), ExecError>;
}

/// Spawns the work item as a child process
///
/// The child inherits this process's stdout and stderr. Output from
/// concurrently running children is not serialized and may interleave.
/// Children get a null stdin so they cannot consume the work queue, and are
/// killed if their task is dropped before they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

#[async_trait]
impl Executor for ProcessExecutor {
    async fn execute(&self, item: WorkItem) -> Result<(), ExecError> {
        debug!(command = %item, "ProcessExecutor::execute: called");
        let status = Command::new(&item.program)
            .args(&item.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| {
                error!(program = %item.program, error = %source, "ProcessExecutor::execute: launch failed");
                ExecError::Spawn {
                    program: item.program.clone(),
                    source,
                }
            })?;

        if status.success() {
            debug!(command = %item, "ProcessExecutor::execute: command succeeded");
            Ok(())
        } else {
            error!(command = %item, code = ?status.code(), "ProcessExecutor::execute: command failed");
            Err(ExecError::Failed {
                command: item.to_string(),
                code: status.code(),
            })
        }
    }
}

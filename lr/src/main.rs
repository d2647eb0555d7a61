//! Linerate - rate-limited command launcher
//!
//! CLI entry point: reads stdin and launches one command per line.

use std::io::IsTerminal;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::debug;

use linerate::cli::Cli;
use linerate::config::{Config, RunConfig};
use linerate::executor::ProcessExecutor;
use linerate::scheduler::Scheduler;
use linerate::source::{LineSource, ensure_redirected};

fn parse_level(level: &str) -> tracing::Level {
    match level.to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", level);
            tracing::Level::WARN
        }
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (WARN)
    let level = cli_log_level
        .or(config_log_level)
        .map(parse_level)
        .unwrap_or(tracing::Level::WARN);

    // stdout belongs to the launched commands
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    ensure_redirected(std::io::stdin().is_terminal())?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let run = RunConfig::resolve(&cli, &config)?;
    debug!(?run, "main: resolved run configuration");

    let scheduler = Scheduler::new(run.scheduler, run.template);
    let source = LineSource::spawn(tokio::io::stdin());
    match scheduler.run(source, Arc::new(ProcessExecutor)).await {
        Ok(summary) => {
            debug!(?summary, "main: run complete");
            Ok(())
        }
        Err(e) => {
            // The runtime's blocking stdin read cannot be cancelled; exit directly.
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

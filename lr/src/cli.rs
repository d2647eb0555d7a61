//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::scheduler::RefillPolicy;

/// Linerate - run a command for every input line, rate and concurrency limited
#[derive(Debug, Parser)]
#[command(
    name = "lr",
    about = "Run a command for every line of stdin under a launch-rate and in-flight limit",
    version = env!("GIT_DESCRIBE"),
    after_help = "Every `{}` in the command's arguments is replaced with the input line.\n\
                  Example: find . -name '*.log' | lr --rate 5 --inflight 2 gzip {}"
)]
pub struct Cli {
    /// Max command launches per second
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub rate: Option<u32>,

    /// Max commands running at the same time
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub inflight: Option<u32>,

    /// Rate refill policy (top-up, token-bucket)
    #[arg(long)]
    pub refill: Option<RefillPolicy>,

    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Command to launch, followed by its arguments
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

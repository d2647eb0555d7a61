//! Command templates and the work items rendered from them

use std::ffi::{OsStr, OsString};
use std::fmt;

use tracing::debug;

use crate::error::ConfigError;

/// Token replaced with the input line in every argument fragment
pub const PLACEHOLDER: &str = "{}";

/// The command to launch per input line
///
/// The program name is taken verbatim; only the argument fragments carry
/// placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<String>,
}

impl CommandTemplate {
    /// Create a template from a program and its argument fragments
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build a template from positional argv (`program arg...`)
    pub fn from_argv(argv: Vec<String>) -> Result<Self, ConfigError> {
        debug!(?argv, "CommandTemplate::from_argv: called");
        let mut argv = argv.into_iter();
        let program = argv.next().ok_or(ConfigError::MissingCommand)?;
        Ok(Self::new(program, argv.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Render the concrete argument list for one input line
    ///
    /// The line is spliced in as-is, so arguments built from non-UTF-8 lines
    /// keep their original bytes.
    pub fn render(&self, line: impl Into<OsString>) -> WorkItem {
        let line = line.into();
        let args = self.args.iter().map(|arg| substitute(arg, &line)).collect();
        WorkItem {
            line,
            program: self.program.clone(),
            args,
        }
    }
}

/// Replace every non-overlapping `{}` in `fragment`, scanning left to right
fn substitute(fragment: &str, line: &OsStr) -> OsString {
    let mut out = OsString::with_capacity(fragment.len() + line.len());
    let mut rest = fragment;
    while let Some(at) = rest.find(PLACEHOLDER) {
        out.push(&rest[..at]);
        out.push(line);
        rest = &rest[at + PLACEHOLDER.len()..];
    }
    out.push(rest);
    out
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// One input line paired with its fully substituted command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub line: OsString,
    pub program: String,
    pub args: Vec<OsString>,
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

//! # Outbound Ports
//!
//! The process seam the orchestration service drives: structured command
//! construction, blocking and detached execution, group signalling. The OS
//! adapter implements [`ProcessRunner`] for real; the fake in `test_utils`
//! implements it for tests.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::entities::Pgid;

// =============================================================================
// COMMANDS
// =============================================================================

/// A program invocation as data: binary, argument list, optional stderr
/// log.
///
/// Built by the command factories and handed to a [`ProcessRunner`]. No
/// shell is involved anywhere, so names and paths never pass through word
/// splitting or quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<String>,
    stderr_log: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stderr_log: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a filesystem path as a single argument.
    pub fn path_arg(mut self, path: impl AsRef<Path>) -> Self {
        self.args.push(path.as_ref().display().to_string());
        self
    }

    /// Append the launched process's stderr to `path`, creating the file
    /// on demand.
    pub fn log_stderr_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stderr_log = Some(path.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn stderr_log(&self) -> Option<&Path> {
        self.stderr_log.as_deref()
    }

    /// Value following `flag`, for diagnostics and tests.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .windows(2)
            .find(|pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
    }

    /// One printable line for logs.
    pub fn display_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

// =============================================================================
// SIGNALS AND HANDLES
// =============================================================================

/// Group signals the fleet sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Polite shutdown (SIGTERM).
    Terminate,
    /// Forced kill (SIGKILL).
    Kill,
}

/// What became of a delivered signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    Delivered,
    /// The group was already gone; benign when stopping.
    NoSuchGroup,
}

/// Handle to a process group launched by [`ProcessRunner::spawn_detached`].
///
/// Only the group id is retained. The roster persists the id, and later
/// signals rebuild the handle from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pgid: Pgid,
}

impl ProcessHandle {
    pub fn new(pgid: Pgid) -> Self {
        Self { pgid }
    }

    pub fn pgid(&self) -> Pgid {
        self.pgid
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to launch `{program}`: {reason}")]
pub struct LaunchError {
    pub program: String,
    pub reason: String,
}

impl LaunchError {
    pub fn new(spec: &CommandSpec, reason: impl Into<String>) -> Self {
        Self {
            program: spec.program().display().to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to signal process group {pgid}: {reason}")]
pub struct SignalError {
    pub pgid: Pgid,
    pub reason: String,
}

// =============================================================================
// PORT TRAIT
// =============================================================================

/// Drives the external node processes.
pub trait ProcessRunner: Send + Sync {
    /// Run to completion; a nonzero exit status is an error.
    fn run(&self, spec: &CommandSpec) -> Result<(), LaunchError>;

    /// Launch without waiting, as leader of a fresh process group.
    fn spawn_detached(&self, spec: &CommandSpec) -> Result<ProcessHandle, LaunchError>;

    /// Deliver `signal` to an entire process group.
    fn signal_group(
        &self,
        handle: ProcessHandle,
        signal: SignalKind,
    ) -> Result<SignalOutcome, SignalError>;
}

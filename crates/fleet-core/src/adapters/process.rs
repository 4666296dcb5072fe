//! OS process execution: blocking runs, detached spawns, group signals.

use std::fs::OpenOptions;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use crate::domain::entities::Pgid;
use crate::ports::outbound::{
    CommandSpec, LaunchError, ProcessHandle, ProcessRunner, SignalKind, SignalOutcome,
};

/// [`ProcessRunner`] backed by `std::process` and Unix process groups.
///
/// Detached children are made leaders of a fresh process group, so they
/// outlive this process and remain signalable as one unit together with
/// anything they fork. Nothing waits on them; once this process exits
/// they reparent to init.
pub struct OsProcessRunner;

impl OsProcessRunner {
    fn command(spec: &CommandSpec) -> Command {
        let mut command = Command::new(spec.program());
        command.args(spec.args());
        command
    }

    fn stderr_sink(spec: &CommandSpec) -> Result<Option<std::fs::File>, LaunchError> {
        let Some(path) = spec.stderr_log() else {
            return Ok(None);
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    LaunchError::new(spec, format!("create log dir {}: {err}", parent.display()))
                })?;
            }
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map(Some)
            .map_err(|err| LaunchError::new(spec, format!("open log {}: {err}", path.display())))
    }
}

impl ProcessRunner for OsProcessRunner {
    fn run(&self, spec: &CommandSpec) -> Result<(), LaunchError> {
        let mut command = Self::command(spec);
        command.stdin(Stdio::null());
        if let Some(file) = Self::stderr_sink(spec)? {
            command.stderr(Stdio::from(file));
        }
        debug!("[process] running {}", spec.display_line());
        let status = command
            .status()
            .map_err(|err| LaunchError::new(spec, err.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(LaunchError::new(spec, format!("exited with {status}")))
        }
    }

    fn spawn_detached(&self, spec: &CommandSpec) -> Result<ProcessHandle, LaunchError> {
        let mut command = Self::command(spec);
        command.stdin(Stdio::null()).stdout(Stdio::null());
        match Self::stderr_sink(spec)? {
            Some(file) => command.stderr(Stdio::from(file)),
            None => command.stderr(Stdio::null()),
        };
        // Fresh group, leader pid == group id.
        command.process_group(0);
        let child = command
            .spawn()
            .map_err(|err| LaunchError::new(spec, err.to_string()))?;
        let handle = ProcessHandle::new(Pgid(child.id() as i32));
        info!(
            "[process] spawned `{}` as process group {}",
            spec.display_line(),
            handle.pgid()
        );
        Ok(handle)
    }

    fn signal_group(
        &self,
        handle: ProcessHandle,
        signal: SignalKind,
    ) -> Result<SignalOutcome, crate::ports::outbound::SignalError> {
        let sig = match signal {
            SignalKind::Terminate => Signal::SIGTERM,
            SignalKind::Kill => Signal::SIGKILL,
        };
        match killpg(Pid::from_raw(handle.pgid().as_raw()), sig) {
            Ok(()) => {
                info!("[process] sent {:?} to group {}", signal, handle.pgid());
                Ok(SignalOutcome::Delivered)
            }
            Err(Errno::ESRCH) => {
                warn!("[process] group {} is already gone", handle.pgid());
                Ok(SignalOutcome::NoSuchGroup)
            }
            Err(err) => Err(crate::ports::outbound::SignalError {
                pgid: handle.pgid(),
                reason: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_succeeds_on_zero_exit() {
        let runner = OsProcessRunner;
        runner.run(&CommandSpec::new("true")).unwrap();
    }

    #[test]
    fn test_run_reports_nonzero_exit() {
        let runner = OsProcessRunner;
        let err = runner.run(&CommandSpec::new("false")).unwrap_err();
        assert!(err.reason.contains("exited with"));
    }

    #[test]
    fn test_run_reports_missing_program() {
        let runner = OsProcessRunner;
        let err = runner
            .run(&CommandSpec::new("/definitely/not/there"))
            .unwrap_err();
        assert_eq!(err.program, "/definitely/not/there");
    }

    #[test]
    fn test_stderr_appends_to_log() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("logs/run.log");
        let runner = OsProcessRunner;
        let spec = CommandSpec::new("sh")
            .arg("-c")
            .arg("echo oops >&2")
            .log_stderr_to(log.clone());
        runner.run(&spec).unwrap();
        runner.run(&spec).unwrap();
        let content = std::fs::read_to_string(&log).unwrap();
        assert_eq!(content, "oops\noops\n");
    }

    #[test]
    fn test_spawn_then_terminate_group() {
        let runner = OsProcessRunner;
        let spec = CommandSpec::new("sleep").arg("30");
        let handle = runner.spawn_detached(&spec).unwrap();
        assert!(handle.pgid().as_raw() > 0);
        let outcome = runner
            .signal_group(handle, SignalKind::Terminate)
            .unwrap();
        assert_eq!(outcome, SignalOutcome::Delivered);
    }

    #[test]
    fn test_signal_unknown_group_is_benign() {
        let runner = OsProcessRunner;
        // A group id far beyond any live pid.
        let handle = ProcessHandle::new(Pgid(i32::MAX - 1));
        let outcome = runner
            .signal_group(handle, SignalKind::Terminate)
            .unwrap();
        assert_eq!(outcome, SignalOutcome::NoSuchGroup);
    }
}

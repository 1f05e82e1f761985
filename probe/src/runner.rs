//! Blocking execution of a [`ProbeCommand`].
//!
//! Every runner spawns exactly one child per call and waits for it before
//! returning, so callers never see two children alive at once.

use crate::command::ProbeCommand;
use probe_types::{ExitStatus, ProbeError, ProbeResult};
use std::os::unix::process::ExitStatusExt;
use std::process::Command;
use tracing::debug;

pub const DEFAULT_SHELL: &str = "/bin/sh";

pub trait CommandRunner {
    /// Execute `command`, block until the child terminates and report how it exited.
    fn run(&mut self, command: &ProbeCommand) -> ProbeResult<ExitStatus>;
}

/// Spawns the program directly with an explicit argument list.
#[derive(Debug, Default)]
pub struct DirectRunner;

impl CommandRunner for DirectRunner {
    fn run(&mut self, command: &ProbeCommand) -> ProbeResult<ExitStatus> {
        let status = Command::new(&command.program)
            .args(&command.args)
            .status()
            .map_err(|err| ProbeError::spawn(&command.program, err))?;
        Ok(convert_status(status))
    }
}

/// Hands the whole command line to `<shell> -c`, the way `system(3)` does.
#[derive(Debug)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl CommandRunner for ShellRunner {
    fn run(&mut self, command: &ProbeCommand) -> ProbeResult<ExitStatus> {
        debug!("{} -c {:?}", self.shell, command.line());
        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command.line())
            .status()
            .map_err(|err| ProbeError::spawn(&self.shell, err))?;
        Ok(convert_status(status))
    }
}

/// Stopped children carry neither a code nor a signal; `status()` never
/// returns one, so that case maps to `-1`.
fn convert_status(status: std::process::ExitStatus) -> ExitStatus {
    match (status.code(), status.signal()) {
        (Some(code), _) => ExitStatus::ExitedWith(code),
        (None, Some(sig)) => ExitStatus::Signaled(sig),
        (None, None) => ExitStatus::ExitedWith(-1),
    }
}

//! The probe loop: spawn the same command a fixed number of times, one after
//! another, then print the closing line.

use crate::command::ProbeCommand;
use crate::runner::CommandRunner;
use crate::timer;
use probe_types::{ProbeError, ProbeResult};
use serde::Deserialize;
use std::io::Write;
use tracing::{debug, info, warn};

pub const DEFAULT_ITERATIONS: u32 = 100;
pub const CLOSING_LINE: &str = "Hello World! This is a test program.";

/// What to do when a child process cannot be created at all.
///
/// A child that starts and then exits non-zero is not a spawn failure; its
/// status is discarded under either policy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnErrorPolicy {
    /// Stop the loop and return the error. The closing line is not printed.
    #[default]
    Abort,
    /// Log the failure and carry on with the next iteration.
    Continue,
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub command: ProbeCommand,
    pub iterations: u32,
    pub on_spawn_error: SpawnErrorPolicy,
    /// Emit before/after millisecond stamps for every iteration.
    pub timestamps: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            command: ProbeCommand::default(),
            iterations: DEFAULT_ITERATIONS,
            on_spawn_error: SpawnErrorPolicy::default(),
            timestamps: false,
        }
    }
}

/// Tally of a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub invocations: u32,
    pub nonzero_exits: u32,
    pub spawn_failures: u32,
}

pub fn run<R, W>(settings: &RunSettings, runner: &mut R, out: &mut W) -> ProbeResult<RunSummary>
where
    R: CommandRunner + ?Sized,
    W: Write + ?Sized,
{
    let command = &settings.command;
    let mut summary = RunSummary::default();
    debug!(
        "probing `{}` {} times (on spawn error: {:?})",
        command, settings.iterations, settings.on_spawn_error
    );

    for i in 0..settings.iterations {
        let before = stamp(settings.timestamps)?;
        let result = runner.run(command);
        let after = stamp(settings.timestamps)?;
        summary.invocations += 1;

        if let (Some(before), Some(after)) = (before, after) {
            info!(iteration = i, before, after, "spawned");
        }

        match result {
            Ok(status) => {
                if !status.success() {
                    summary.nonzero_exits += 1;
                }
                debug!("iteration {} finished with {}", i, status);
            }
            Err(err @ ProbeError::Spawn { .. }) => {
                summary.spawn_failures += 1;
                match settings.on_spawn_error {
                    SpawnErrorPolicy::Abort => return Err(err),
                    SpawnErrorPolicy::Continue => warn!("iteration {}: {}", i, err),
                }
            }
            Err(err) => return Err(err),
        }
    }

    writeln!(out, "{CLOSING_LINE}")?;
    out.flush()?;
    debug!("run finished: {:?}", summary);
    Ok(summary)
}

fn stamp(enabled: bool) -> ProbeResult<Option<i64>> {
    if enabled {
        timer::now_millis().map(Some)
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_types::ExitStatus;
    use std::io;

    /// Replays a scripted sequence of outcomes and records every command it was given.
    struct ScriptedRunner {
        outcomes: Box<dyn FnMut(u32) -> ProbeResult<ExitStatus>>,
        seen: Vec<ProbeCommand>,
    }

    impl ScriptedRunner {
        fn new(outcomes: impl FnMut(u32) -> ProbeResult<ExitStatus> + 'static) -> Self {
            Self {
                outcomes: Box::new(outcomes),
                seen: Vec::new(),
            }
        }

        fn always(status: ExitStatus) -> Self {
            Self::new(move |_| Ok(status))
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&mut self, command: &ProbeCommand) -> ProbeResult<ExitStatus> {
            self.seen.push(command.clone());
            (self.outcomes)(self.seen.len() as u32)
        }
    }

    fn not_found() -> ProbeError {
        ProbeError::spawn("node", io::Error::new(io::ErrorKind::NotFound, "not found"))
    }

    #[test]
    fn test_default_settings() {
        let settings = RunSettings::default();
        assert_eq!(settings.iterations, 100);
        assert_eq!(settings.on_spawn_error, SpawnErrorPolicy::Abort);
        assert_eq!(settings.command, ProbeCommand::default());
        assert!(!settings.timestamps);
    }

    #[test]
    fn test_runs_exactly_iterations_times_with_same_command() {
        let settings = RunSettings::default();
        let mut runner = ScriptedRunner::always(ExitStatus::ExitedWith(0));
        let mut out = Vec::new();

        let summary = run(&settings, &mut runner, &mut out).unwrap();

        assert_eq!(summary.invocations, 100);
        assert_eq!(runner.seen.len(), 100);
        assert!(runner.seen.iter().all(|c| *c == settings.command));
    }

    #[test]
    fn test_closing_line_written_once() {
        let settings = RunSettings::default();
        let mut runner = ScriptedRunner::always(ExitStatus::ExitedWith(0));
        let mut out = Vec::new();

        run(&settings, &mut runner, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Hello World! This is a test program.\n"
        );
    }

    #[test]
    fn test_nonzero_exits_are_discarded() {
        let settings = RunSettings::default();
        let mut runner = ScriptedRunner::new(|n| {
            Ok(if n % 2 == 0 {
                ExitStatus::ExitedWith(1)
            } else {
                ExitStatus::Signaled(15)
            })
        });
        let mut out = Vec::new();

        let summary = run(&settings, &mut runner, &mut out).unwrap();

        assert_eq!(summary.invocations, 100);
        assert_eq!(summary.nonzero_exits, 100);
        assert_eq!(summary.spawn_failures, 0);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_abort_policy_stops_at_first_spawn_failure() {
        let settings = RunSettings::default();
        let mut runner = ScriptedRunner::new(|n| {
            if n == 3 {
                Err(not_found())
            } else {
                Ok(ExitStatus::ExitedWith(0))
            }
        });
        let mut out = Vec::new();

        let err = run(&settings, &mut runner, &mut out).unwrap_err();

        assert!(err.is_spawn());
        assert_eq!(runner.seen.len(), 3);
        assert!(out.is_empty());
    }

    #[test]
    fn test_continue_policy_finishes_the_loop() {
        let settings = RunSettings {
            on_spawn_error: SpawnErrorPolicy::Continue,
            ..RunSettings::default()
        };
        let mut runner = ScriptedRunner::new(|_| Err(not_found()));
        let mut out = Vec::new();

        let summary = run(&settings, &mut runner, &mut out).unwrap();

        assert_eq!(summary.invocations, 100);
        assert_eq!(summary.spawn_failures, 100);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{CLOSING_LINE}\n")
        );
    }

    #[test]
    fn test_non_spawn_errors_always_abort() {
        let settings = RunSettings {
            on_spawn_error: SpawnErrorPolicy::Continue,
            ..RunSettings::default()
        };
        let mut runner = ScriptedRunner::new(|_| Err(ProbeError::Clock("EINVAL".to_string())));
        let mut out = Vec::new();

        let err = run(&settings, &mut runner, &mut out).unwrap_err();

        assert!(matches!(err, ProbeError::Clock(_)));
        assert_eq!(runner.seen.len(), 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_timestamps_do_not_change_the_run() {
        let settings = RunSettings {
            iterations: 5,
            timestamps: true,
            ..RunSettings::default()
        };
        let mut runner = ScriptedRunner::always(ExitStatus::ExitedWith(0));
        let mut out = Vec::new();

        let summary = run(&settings, &mut runner, &mut out).unwrap();

        assert_eq!(summary.invocations, 5);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_zero_iterations_still_prints_closing_line() {
        let settings = RunSettings {
            iterations: 0,
            ..RunSettings::default()
        };
        let mut runner = ScriptedRunner::always(ExitStatus::ExitedWith(0));
        let mut out = Vec::new();

        let summary = run(&settings, &mut runner, &mut out).unwrap();

        assert_eq!(summary, RunSummary::default());
        assert!(runner.seen.is_empty());
        assert_eq!(String::from_utf8(out).unwrap(), format!("{CLOSING_LINE}\n"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_closing_line_write_failure_is_io_error() {
        let settings = RunSettings {
            iterations: 1,
            ..RunSettings::default()
        };
        let mut runner = ScriptedRunner::always(ExitStatus::ExitedWith(0));

        let err = run(&settings, &mut runner, &mut BrokenPipe).unwrap_err();

        assert!(matches!(err, ProbeError::Io(_)));
    }
}

pub mod command;
pub mod config;
pub mod driver;
pub mod runner;
pub mod timer;

use crate::config::ProbeConfig;
use crate::driver::RunSummary;
use crate::runner::{CommandRunner, DirectRunner, ShellRunner};
use probe_types::ProbeResult;
use std::io::Write;

/// Pick the runner the config asks for.
pub fn runner_for(config: &ProbeConfig) -> Box<dyn CommandRunner> {
    if config.via_shell {
        Box::new(ShellRunner::new(config.shell.clone()))
    } else {
        Box::new(DirectRunner)
    }
}

/// Run the probe described by `config`, writing the closing line to `out`.
pub fn run_probe(config: &ProbeConfig, out: &mut dyn Write) -> ProbeResult<RunSummary> {
    let settings = config.run_settings()?;
    let mut runner = runner_for(config);
    driver::run(&settings, runner.as_mut(), out)
}

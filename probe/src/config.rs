use crate::command::{DEFAULT_COMMAND, ProbeCommand};
use crate::driver::{DEFAULT_ITERATIONS, RunSettings, SpawnErrorPolicy};
use crate::runner::DEFAULT_SHELL;
use probe_types::{ProbeError, ProbeResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const APP_NAME: &str = "spawn-probe";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    pub command: String,
    pub iterations: u32,
    pub via_shell: bool,
    pub shell: String,
    pub on_spawn_error: SpawnErrorPolicy,
    pub timestamps: bool,
}

impl Default for ProbeConfig {
    fn default() -> ProbeConfig {
        ProbeConfig {
            command: DEFAULT_COMMAND.to_string(),
            iterations: DEFAULT_ITERATIONS,
            via_shell: false,
            shell: DEFAULT_SHELL.to_string(),
            on_spawn_error: SpawnErrorPolicy::default(),
            timestamps: false,
        }
    }
}

/// Command line values that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub command: Option<String>,
    pub iterations: Option<u32>,
    pub via_shell: Option<bool>,
    pub keep_going: bool,
    pub timestamps: Option<bool>,
}

impl ProbeConfig {
    pub fn from_toml(toml_str: &str) -> ProbeResult<Self> {
        toml::from_str(toml_str).map_err(|err| ProbeError::Config(err.to_string()))
    }

    /// Read a config file that must exist.
    pub fn read_file(path: &Path) -> ProbeResult<Self> {
        let toml_str = std::fs::read_to_string(path).map_err(|err| {
            ProbeError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        toml::from_str(&toml_str)
            .map_err(|err| ProbeError::Config(format!("{}: {}", path.display(), err)))
    }

    /// Load `path` when given, otherwise the XDG config file if there is one.
    pub fn load(path: Option<&Path>) -> ProbeResult<Self> {
        match path {
            Some(path) => Self::read_file(path),
            None => match default_config_path() {
                Some(path) => {
                    debug!("using config {:?}", path);
                    Self::read_file(&path)
                }
                None => Ok(ProbeConfig::default()),
            },
        }
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(command) = overrides.command {
            self.command = command;
        }
        if let Some(iterations) = overrides.iterations {
            self.iterations = iterations;
        }
        if let Some(via_shell) = overrides.via_shell {
            self.via_shell = via_shell;
        }
        if let Some(timestamps) = overrides.timestamps {
            self.timestamps = timestamps;
        }
        if overrides.keep_going {
            self.on_spawn_error = SpawnErrorPolicy::Continue;
        }
    }

    pub fn run_settings(&self) -> ProbeResult<RunSettings> {
        Ok(RunSettings {
            command: ProbeCommand::parse(&self.command)?,
            iterations: self.iterations,
            on_spawn_error: self.on_spawn_error,
            timestamps: self.timestamps,
        })
    }
}

/// `$XDG_CONFIG_HOME/spawn-probe/config.toml`, only if it exists.
pub fn default_config_path() -> Option<PathBuf> {
    let xdg_dir = xdg::BaseDirectories::with_prefix(APP_NAME).ok()?;
    xdg_dir.find_config_file(CONFIG_FILE)
}

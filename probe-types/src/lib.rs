use nix::sys::signal::Signal;
use std::fmt;
use thiserror::Error;

/// spawn-probe specific error types
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("clock read failed: {0}")]
    Clock(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProbeError {
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        ProbeError::Spawn {
            program: program.into(),
            source,
        }
    }

    pub fn is_spawn(&self) -> bool {
        matches!(self, ProbeError::Spawn { .. })
    }
}

pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

/// How a reaped child finished.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ExitStatus {
    ExitedWith(i32),
    Signaled(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::ExitedWith(0))
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::ExitedWith(code) => write!(f, "exit code {code}"),
            ExitStatus::Signaled(sig) => match Signal::try_from(*sig) {
                Ok(signal) => write!(f, "killed by {}", signal.as_str()),
                Err(_) => write!(f, "killed by signal {sig}"),
            },
        }
    }
}

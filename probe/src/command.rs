use probe_types::{ProbeError, ProbeResult};
use std::fmt;

/// Interpreter invocation of the companion hello world script.
pub const DEFAULT_COMMAND: &str = "node socket-experiments/js_hello_world.js";

/// A program plus its argument list, executed without shell interpretation.
///
/// The command line it came from is kept verbatim for runners that hand it
/// to a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCommand {
    pub program: String,
    pub args: Vec<String>,
    line: String,
}

impl ProbeCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program = program.into();
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let line = shell_words::join(std::iter::once(&program).chain(args.iter()));
        Self {
            program,
            args,
            line,
        }
    }

    /// Split a command line into program and arguments.
    ///
    /// Quoting is honoured the way a POSIX shell would tokenize it, but no
    /// expansion, globbing or redirection takes place.
    pub fn parse(line: &str) -> ProbeResult<Self> {
        let mut words = shell_words::split(line)
            .map_err(|err| ProbeError::Config(format!("invalid command `{line}`: {err}")))?
            .into_iter();
        let program = words
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ProbeError::Config("command must name a program".to_string()))?;
        Ok(Self {
            program,
            args: words.collect(),
            line: line.trim().to_string(),
        })
    }

    /// The command line as given to [`ProbeCommand::parse`], or the quoted
    /// program and arguments for one built with [`ProbeCommand::new`].
    pub fn line(&self) -> &str {
        &self.line
    }
}

impl Default for ProbeCommand {
    fn default() -> Self {
        Self::new("node", ["socket-experiments/js_hello_world.js"])
    }
}

impl fmt::Display for ProbeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

use anyhow::{Context as _, Result};
use clap::Parser;
use spawn_probe::config::{Overrides, ProbeConfig};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SPAWN_PROBE_LOG";
const TIMESTAMP_DIRECTIVE: &str = "spawn_probe::driver=info";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/spawn-probe/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of sequential spawns
    #[arg(short = 'n', long)]
    iterations: Option<u32>,

    /// Command line to spawn
    #[arg(short, long)]
    command: Option<String>,

    /// Run the command through `<shell> -c` instead of spawning it directly
    #[arg(long, conflicts_with = "direct")]
    via_shell: bool,

    /// Spawn the command directly even if the config asks for a shell
    #[arg(long)]
    direct: bool,

    /// Keep looping when a child cannot be spawned
    #[arg(long)]
    keep_going: bool,

    /// Log before/after timestamps for every spawn
    #[arg(long, conflicts_with = "no_timestamps")]
    timestamps: bool,

    /// Don't log timestamps even if the config enables them
    #[arg(long)]
    no_timestamps: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            command: self.command.clone(),
            iterations: self.iterations,
            via_shell: switch(self.via_shell, self.direct),
            keep_going: self.keep_going,
            timestamps: switch(self.timestamps, self.no_timestamps),
        }
    }
}

fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("spawn-probe: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_tracing(config.timestamps) {
        eprintln!("Failed to initialize tracing: {err}");
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("spawn-probe: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<ProbeConfig> {
    let mut config = ProbeConfig::load(cli.config.as_deref()).context("failed to load config")?;
    config.apply(cli.overrides());
    Ok(config)
}

fn run(config: &ProbeConfig) -> Result<()> {
    debug!("effective config: {:?}", config);

    let stdout = std::io::stdout();
    let summary = spawn_probe::run_probe(config, &mut stdout.lock())
        .with_context(|| format!("probe of `{}` failed", config.command))?;
    debug!("{:?}", summary);
    Ok(())
}

/// Per-spawn stamps are `info!` events from the driver, so they need that
/// target let through whatever the base filter is.
fn init_tracing(timestamps: bool) -> Result<()> {
    let mut filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    if timestamps {
        filter = filter.add_directive(TIMESTAMP_DIRECTIVE.parse()?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(std::io::stderr().is_terminal())
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;
    Ok(())
}

// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `themewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "themewatch",
    version,
    about = "Build, watch and live-reload the assets of a WordPress theme.",
    long_about = None
)]
pub struct CliArgs {
    /// Project root. The theme lives under `<root>/<themes_dir>/<THEME_NAME>`.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: String,

    /// Environment file holding `THEME_NAME` and `NGINX_HOST_PORT_80`.
    ///
    /// Relative paths are resolved against `--root`.
    #[arg(long, value_name = "PATH", default_value = ".env")]
    pub env_file: String,

    /// Optional TOML config file. A missing file means all defaults.
    ///
    /// Relative paths are resolved against `--root`.
    #[arg(long, value_name = "PATH", default_value = "Themewatch.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `THEMEWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve settings, print tasks and watch bindings, run nothing.
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    /// The command to run; no subcommand means [`Command::Default`].
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Start the dev proxy and the watcher together.
    Default,
    /// Watch and rebuild without the dev proxy.
    Watch,
    /// Start the dev proxy only.
    Serve,
    /// Run the named tasks once and exit.
    Run {
        /// Task names, e.g. `sass js imagemin`.
        #[arg(required = true, value_name = "TASK")]
        tasks: Vec<String>,
    },
    /// List registered tasks and watch bindings.
    Tasks,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

// src/logging.rs

//! Logging setup for `themewatch` using `tracing` + `tracing-subscriber`.
//!
//! Level priority: `--log-level`, then `THEMEWATCH_LOG`, then `info`.
//! `THEMEWATCH_LOG` accepts full filter directives
//! (`info,themewatch::proxy=debug`); a plain level also keeps the HTTP
//! stack quiet. Output goes to stderr so stdout only carries task messages.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "THEMEWATCH_LOG";

/// Dependencies that are chatty at `debug` and below.
const QUIET_CRATES: &[&str] = &["hyper", "hyper_util", "reqwest", "tungstenite", "notify"];

/// Initialise the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let directives = filter_directives(cli_level, std::env::var(LOG_ENV).ok().as_deref());
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter {directives:?}"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Filter string for the given flag and `THEMEWATCH_LOG` value.
pub fn filter_directives(cli_level: Option<LogLevel>, env_value: Option<&str>) -> String {
    if let Some(level) = cli_level {
        return with_quiet_deps(level_name(level));
    }

    match env_value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) if is_plain_level(value) => with_quiet_deps(&value.to_lowercase()),
        Some(value) => value.to_string(),
        None => with_quiet_deps("info"),
    }
}

fn with_quiet_deps(level: &str) -> String {
    let mut out = level.to_string();
    for krate in QUIET_CRATES {
        out.push_str(&format!(",{krate}=warn"));
    }
    out
}

fn is_plain_level(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "error" | "warn" | "info" | "debug" | "trace"
    )
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

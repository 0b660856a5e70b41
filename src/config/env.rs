// src/config/env.rs

//! Reading the two required variables from the `.env` file.
//!
//! The file is parsed with `dotenvy` into a map; the process environment is
//! never modified. A variable already present in the process environment
//! takes precedence over the file.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::errors::{Result, ThemewatchError};

pub const THEME_NAME_KEY: &str = "THEME_NAME";
pub const UPSTREAM_PORT_KEY: &str = "NGINX_HOST_PORT_80";

/// The environment-derived part of the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvValues {
    pub theme_name: String,
    pub upstream_port: u16,
}

/// Parse an env file into a key/value map. A missing file yields an empty map.
pub fn read_env_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(err) if err.not_found() => {
            debug!(path = ?path, "no env file; relying on the process environment");
            return Ok(BTreeMap::new());
        }
        Err(err) => {
            return Err(ThemewatchError::ConfigError(format!(
                "reading env file {path:?}: {err}"
            )));
        }
    };

    let mut vars = BTreeMap::new();
    for item in iter {
        let (key, value) = item.map_err(|err| {
            ThemewatchError::ConfigError(format!("parsing env file {path:?}: {err}"))
        })?;
        vars.insert(key, value);
    }
    Ok(vars)
}

/// Resolve the required values from the file map and a process-env lookup.
///
/// `lookup` is injected so that tests do not depend on the real environment.
pub fn resolve_env<F>(
    env_file: &Path,
    file_vars: &BTreeMap<String, String>,
    lookup: F,
) -> Result<EnvValues>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| -> Result<String> {
        lookup(key)
            .or_else(|| file_vars.get(key).cloned())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ThemewatchError::MissingEnv {
                key: key.to_string(),
                env_file: env_file.to_path_buf(),
            })
    };

    let theme_name = get(THEME_NAME_KEY)?;
    let raw_port = get(UPSTREAM_PORT_KEY)?;
    let upstream_port = raw_port.parse::<u16>().map_err(|_| {
        ThemewatchError::ConfigError(format!(
            "{UPSTREAM_PORT_KEY} must be a port number (got {raw_port:?})"
        ))
    })?;

    Ok(EnvValues {
        theme_name,
        upstream_port,
    })
}

/// Read the env file and resolve against the real process environment.
///
/// This is the only place the process environment is consulted.
pub fn load_env(env_file: &Path) -> Result<EnvValues> {
    let file_vars = read_env_file(env_file)?;
    resolve_env(env_file, &file_vars, |key| std::env::var(key).ok())
}

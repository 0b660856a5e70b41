// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::env::load_env;
use crate::config::model::{RawConfigFile, Settings};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_settings`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Like [`load_from_path`], but a missing file yields the defaults.
pub fn load_optional(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = ?path, "no config file; using defaults");
        return Ok(RawConfigFile::default());
    }
    load_from_path(path)
}

/// Load everything the process needs and resolve it into `Settings`.
///
/// - Reads `THEME_NAME` / `NGINX_HOST_PORT_80` (env file + process env).
/// - Reads the optional TOML file.
/// - Validates and resolves paths against `root`.
///
/// `env_file` and `config_file` are resolved against `root` when relative.
pub fn load_settings(
    root: impl AsRef<Path>,
    env_file: impl AsRef<Path>,
    config_file: impl AsRef<Path>,
) -> Result<Settings> {
    let root = root.as_ref();
    let env_path = resolve_against(root, env_file.as_ref());
    let config_path = resolve_against(root, config_file.as_ref());

    let env = load_env(&env_path)?;
    let raw = load_optional(&config_path)?;
    Settings::resolve(root, env, raw)
}

fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Default location of the optional config file, relative to the project root.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Themewatch.toml")
}

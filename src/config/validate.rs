// src/config/validate.rs

use std::net::IpAddr;
use std::path::{Component, Path};

use crate::config::env::EnvValues;
use crate::config::model::{RawConfigFile, Settings, ThemeLayout, Upstream};
use crate::errors::{Result, ThemewatchError};

impl Settings {
    /// Validate the raw inputs and resolve them into `Settings`.
    pub fn resolve(root: &Path, env: EnvValues, raw: RawConfigFile) -> Result<Settings> {
        validate_theme_name(&env.theme_name)?;
        validate_proxy(&raw, env.upstream_port)?;
        validate_watch(&raw)?;
        validate_images(&raw)?;

        let theme_root = root.join(&raw.theme.themes_dir).join(&env.theme_name);
        let upstream = Upstream {
            host: raw.proxy.upstream_host.clone(),
            port: env.upstream_port,
        };

        Ok(Settings {
            project_root: root.to_path_buf(),
            theme_name: env.theme_name,
            layout: ThemeLayout::new(theme_root),
            upstream,
            proxy: raw.proxy,
            watch: raw.watch,
            notify: raw.notify,
            images: raw.images,
        })
    }
}

fn validate_theme_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ThemewatchError::ConfigError(format!(
            "THEME_NAME must be a single directory name (got {name:?})"
        ))),
    }
}

fn validate_proxy(cfg: &RawConfigFile, upstream_port: u16) -> Result<()> {
    if cfg.proxy.bind.parse::<IpAddr>().is_err() {
        return Err(ThemewatchError::ConfigError(format!(
            "[proxy].bind must be an IP address (got {:?})",
            cfg.proxy.bind
        )));
    }

    if cfg.proxy.upstream_host.trim().is_empty() {
        return Err(ThemewatchError::ConfigError(
            "[proxy].upstream_host must not be empty".to_string(),
        ));
    }

    let upstream = Upstream {
        host: cfg.proxy.upstream_host.clone(),
        port: upstream_port,
    };
    if upstream.is_local() && cfg.proxy.listen_port == upstream_port {
        return Err(ThemewatchError::ConfigError(format!(
            "[proxy].listen_port {} collides with the upstream port",
            cfg.proxy.listen_port
        )));
    }

    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.debounce_ms == 0 {
        return Err(ThemewatchError::ConfigError(
            "[watch].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_images(cfg: &RawConfigFile) -> Result<()> {
    if !(1..=100).contains(&cfg.images.jpeg_quality) {
        return Err(ThemewatchError::ConfigError(format!(
            "[images].jpeg_quality must be in 1..=100 (got {})",
            cfg.images.jpeg_quality
        )));
    }
    if cfg.images.png_preset > 6 {
        return Err(ThemewatchError::ConfigError(format!(
            "[images].png_preset must be in 0..=6 (got {})",
            cfg.images.png_preset
        )));
    }
    Ok(())
}

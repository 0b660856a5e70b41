// src/config/mod.rs

//! Configuration loading and validation for themewatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the resolved `Settings` (`model.rs`).
//! - Read `THEME_NAME` / `NGINX_HOST_PORT_80` from the env file (`env.rs`).
//! - Load everything from disk (`loader.rs`).
//! - Validate and resolve into `Settings` (`validate.rs`).

pub mod env;
pub mod loader;
pub mod model;
pub mod validate;

pub use env::{EnvValues, THEME_NAME_KEY, UPSTREAM_PORT_KEY};
pub use loader::{load_from_path, load_optional, load_settings};
pub use model::{
    ImagesSection, NotifySection, ProxySection, RawConfigFile, Settings, ThemeLayout,
    ThemeSection, Upstream, WatchSection,
};

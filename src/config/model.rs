// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::BusyPolicy;

/// Optional TOML configuration as read from `Themewatch.toml`.
///
/// ```toml
/// [theme]
/// themes_dir = "wordpress/wp-content/themes"
///
/// [proxy]
/// listen_port = 3000
///
/// [watch]
/// busy_policy = "queue"
/// ```
///
/// All sections are optional and have reasonable defaults; a project with no
/// config file at all behaves like the stock gulp setup.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub theme: ThemeSection,

    #[serde(default)]
    pub proxy: ProxySection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub notify: NotifySection,

    #[serde(default)]
    pub images: ImagesSection,
}

/// `[theme]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeSection {
    /// Directory (relative to the project root) that holds the themes.
    #[serde(default = "default_themes_dir")]
    pub themes_dir: String,
}

fn default_themes_dir() -> String {
    "wordpress/wp-content/themes".to_string()
}

impl Default for ThemeSection {
    fn default() -> Self {
        Self {
            themes_dir: default_themes_dir(),
        }
    }
}

/// `[proxy]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxySection {
    /// Address the dev proxy binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port the dev proxy listens on. `0` picks a free port.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Host of the upstream origin; the port comes from `NGINX_HOST_PORT_80`.
    #[serde(default = "default_upstream_host")]
    pub upstream_host: String,

    /// Open the proxied site in the default browser once the proxy is up.
    #[serde(default)]
    pub open_browser: bool,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_listen_port() -> u16 {
    3000
}

fn default_upstream_host() -> String {
    "localhost".to_string()
}

impl Default for ProxySection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            listen_port: default_listen_port(),
            upstream_host: default_upstream_host(),
            open_browser: false,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Debounce window; all changes inside one window form one batch.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// `"queue"` or `"drop"`; see [`BusyPolicy`].
    #[serde(default)]
    pub busy_policy: BusyPolicy,

    /// Ignore change events whose file content hash did not change.
    #[serde(default = "default_skip_unchanged")]
    pub skip_unchanged: bool,
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_skip_unchanged() -> bool {
    true
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            busy_policy: BusyPolicy::default(),
            skip_unchanged: default_skip_unchanged(),
        }
    }
}

/// `[notify]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NotifySection {
    /// Also deliver notifications to the desktop.
    #[serde(default)]
    pub desktop: bool,
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesSection {
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// oxipng preset, 0 (fast) to 6 (slow).
    #[serde(default = "default_png_preset")]
    pub png_preset: u8,
}

fn default_jpeg_quality() -> u8 {
    85
}

fn default_png_preset() -> u8 {
    2
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            png_preset: default_png_preset(),
        }
    }
}

/// Upstream origin the dev proxy forwards to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub host: String,
    pub port: u16,
}

impl Upstream {
    /// `host:port`
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `http://host:port`
    pub fn origin(&self) -> String {
        format!("http://{}", self.authority())
    }

    pub fn is_local(&self) -> bool {
        matches!(self.host.as_str(), "localhost" | "127.0.0.1" | "::1")
    }
}

/// Fixed directory convention under a theme root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeLayout {
    root: PathBuf,
}

impl ThemeLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sass_dir(&self) -> PathBuf {
        self.root.join("sass")
    }

    pub fn css_dir(&self) -> PathBuf {
        self.root.join("css")
    }

    pub fn js_dir(&self) -> PathBuf {
        self.root.join("js")
    }

    pub fn js_dist_dir(&self) -> PathBuf {
        self.root.join("js").join("dist")
    }

    pub fn images_base_dir(&self) -> PathBuf {
        self.root.join("images").join("base")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }
}

/// Fully resolved, validated settings.
///
/// Built once at startup by [`crate::config::load_settings`] (or
/// [`Settings::resolve`]) and handed to every component explicitly. Nothing
/// downstream of this struct looks at the process environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub project_root: PathBuf,
    pub theme_name: String,
    pub layout: ThemeLayout,
    pub upstream: Upstream,
    pub proxy: ProxySection,
    pub watch: WatchSection,
    pub notify: NotifySection,
    pub images: ImagesSection,
}

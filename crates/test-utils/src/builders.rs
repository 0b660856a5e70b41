#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use themewatch::config::{EnvValues, RawConfigFile, Settings};
use themewatch::types::BusyPolicy;

pub const TEST_THEME: &str = "testtheme";
pub const TEST_UPSTREAM_PORT: u16 = 8080;

/// Builder for `Settings` without touching env files.
pub struct SettingsBuilder {
    root: PathBuf,
    env: EnvValues,
    raw: RawConfigFile,
}

impl SettingsBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            env: EnvValues {
                theme_name: TEST_THEME.to_string(),
                upstream_port: TEST_UPSTREAM_PORT,
            },
            raw: RawConfigFile::default(),
        }
    }

    pub fn theme_name(mut self, name: &str) -> Self {
        self.env.theme_name = name.to_string();
        self
    }

    pub fn upstream_port(mut self, port: u16) -> Self {
        self.env.upstream_port = port;
        self
    }

    pub fn busy_policy(mut self, policy: BusyPolicy) -> Self {
        self.raw.watch.busy_policy = policy;
        self
    }

    pub fn skip_unchanged(mut self, val: bool) -> Self {
        self.raw.watch.skip_unchanged = val;
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.raw.watch.debounce_ms = ms;
        self
    }

    pub fn listen_port(mut self, port: u16) -> Self {
        self.raw.proxy.listen_port = port;
        self
    }

    pub fn raw(mut self, f: impl FnOnce(&mut RawConfigFile)) -> Self {
        f(&mut self.raw);
        self
    }

    pub fn build(self) -> Settings {
        Settings::resolve(&self.root, self.env, self.raw)
            .expect("Failed to build valid settings from builder")
    }
}

/// A temporary project with an empty theme directory tree.
pub struct ThemeFixture {
    dir: TempDir,
    settings: Settings,
}

impl ThemeFixture {
    pub fn new() -> Self {
        Self::with(|b| b)
    }

    pub fn with(configure: impl FnOnce(SettingsBuilder) -> SettingsBuilder) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let settings = configure(SettingsBuilder::new(dir.path())).build();
        for sub in [
            settings.layout.sass_dir(),
            settings.layout.css_dir(),
            settings.layout.js_dist_dir(),
            settings.layout.images_base_dir(),
        ] {
            fs::create_dir_all(sub).expect("create theme dirs");
        }
        Self { dir, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn project_root(&self) -> &Path {
        self.dir.path()
    }

    pub fn theme_root(&self) -> &Path {
        self.settings.layout.root()
    }

    /// Absolute path of `rel` under the theme root.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.theme_root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write fixture file");
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap_or_else(|e| panic!("reading {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }
}

impl Default for ThemeFixture {
    fn default() -> Self {
        Self::new()
    }
}

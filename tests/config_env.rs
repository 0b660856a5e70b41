// tests/config_env.rs

mod common;
use crate::common::{init_tracing, ThemeFixture};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use themewatch::config::env::{read_env_file, resolve_env};
use themewatch::config::{load_settings, EnvValues, RawConfigFile, Settings};
use themewatch::errors::ThemewatchError;
use themewatch::types::BusyPolicy;

fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn missing_theme_name_is_missing_env() {
    init_tracing();

    let file = vars(&[("NGINX_HOST_PORT_80", "8080")]);
    let err = resolve_env(Path::new(".env"), &file, |_| None).unwrap_err();

    match err {
        ThemewatchError::MissingEnv { key, .. } => assert_eq!(key, "THEME_NAME"),
        other => panic!("expected MissingEnv, got {other:?}"),
    }
}

#[test]
fn empty_value_counts_as_missing() {
    let file = vars(&[("THEME_NAME", "  "), ("NGINX_HOST_PORT_80", "8080")]);
    let err = resolve_env(Path::new(".env"), &file, |_| None).unwrap_err();
    assert!(matches!(err, ThemewatchError::MissingEnv { ref key, .. } if key == "THEME_NAME"));
}

#[test]
fn process_env_takes_precedence_over_file() {
    let file = vars(&[("THEME_NAME", "from-file"), ("NGINX_HOST_PORT_80", "8080")]);
    let env = resolve_env(Path::new(".env"), &file, |key| {
        (key == "THEME_NAME").then(|| "from-process".to_string())
    })
    .unwrap();

    assert_eq!(
        env,
        EnvValues {
            theme_name: "from-process".to_string(),
            upstream_port: 8080,
        }
    );
}

#[test]
fn non_numeric_port_is_config_error() {
    let file = vars(&[("THEME_NAME", "t"), ("NGINX_HOST_PORT_80", "eighty")]);
    let err = resolve_env(Path::new(".env"), &file, |_| None).unwrap_err();
    assert!(matches!(err, ThemewatchError::ConfigError(_)), "got {err:?}");
}

#[test]
fn missing_env_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let map = read_env_file(&dir.path().join("nope.env")).unwrap();
    assert!(map.is_empty());
}

#[test]
fn env_file_is_parsed_with_quotes_and_comments() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    fs::write(&path, "# theme\nTHEME_NAME=\"mytheme\"\nNGINX_HOST_PORT_80=8088\n").unwrap();

    let map = read_env_file(&path).unwrap();
    assert_eq!(map.get("THEME_NAME").map(String::as_str), Some("mytheme"));
    assert_eq!(map.get("NGINX_HOST_PORT_80").map(String::as_str), Some("8088"));
}

#[test]
fn settings_resolve_theme_root_and_defaults() {
    let fixture = ThemeFixture::new();
    let settings = fixture.settings();

    assert_eq!(
        settings.layout.root(),
        fixture
            .project_root()
            .join("wordpress/wp-content/themes/testtheme")
    );
    assert_eq!(settings.upstream.origin(), "http://localhost:8080");
    assert_eq!(settings.proxy.listen_port, 3000);
    assert_eq!(settings.watch.debounce_ms, 200);
    assert_eq!(settings.watch.busy_policy, BusyPolicy::Queue);
    assert!(settings.watch.skip_unchanged);
    assert_eq!(settings.images.jpeg_quality, 85);
    assert!(!settings.notify.desktop);
}

#[test]
fn load_settings_reads_toml_over_defaults() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".env"),
        "THEME_NAME=acme\nNGINX_HOST_PORT_80=8081\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("Themewatch.toml"),
        r#"
[theme]
themes_dir = "themes"

[proxy]
listen_port = 4000

[watch]
busy_policy = "drop"
debounce_ms = 50
"#,
    )
    .unwrap();

    let settings = load_settings(dir.path(), ".env", "Themewatch.toml").unwrap();
    assert_eq!(settings.theme_name, "acme");
    assert_eq!(settings.layout.root(), dir.path().join("themes/acme"));
    assert_eq!(settings.upstream.port, 8081);
    assert_eq!(settings.proxy.listen_port, 4000);
    assert_eq!(settings.watch.busy_policy, BusyPolicy::Drop);
    assert_eq!(settings.watch.debounce_ms, 50);
}

#[test]
fn invalid_values_are_rejected() {
    let env = || EnvValues {
        theme_name: "t".to_string(),
        upstream_port: 8080,
    };
    let root = Path::new("/project");

    let mut raw = RawConfigFile::default();
    raw.images.jpeg_quality = 0;
    assert!(Settings::resolve(root, env(), raw).is_err());

    let mut raw = RawConfigFile::default();
    raw.images.png_preset = 7;
    assert!(Settings::resolve(root, env(), raw).is_err());

    let mut raw = RawConfigFile::default();
    raw.watch.debounce_ms = 0;
    assert!(Settings::resolve(root, env(), raw).is_err());

    let mut raw = RawConfigFile::default();
    raw.proxy.listen_port = 8080;
    assert!(Settings::resolve(root, env(), raw).is_err());

    let bad_theme = EnvValues {
        theme_name: "../escape".to_string(),
        upstream_port: 8080,
    };
    assert!(Settings::resolve(root, bad_theme, RawConfigFile::default()).is_err());
}

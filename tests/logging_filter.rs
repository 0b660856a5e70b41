// tests/logging_filter.rs

use themewatch::cli::LogLevel;
use themewatch::logging::filter_directives;

#[test]
fn cli_flag_wins_over_environment() {
    let filter = filter_directives(Some(LogLevel::Debug), Some("trace"));
    assert!(filter.starts_with("debug,"), "filter was {filter}");
    assert!(filter.contains("hyper=warn"));
}

#[test]
fn plain_env_level_keeps_dependencies_quiet() {
    let filter = filter_directives(None, Some(" WARN "));
    assert!(filter.starts_with("warn,"), "filter was {filter}");
    assert!(filter.contains("reqwest=warn"));
}

#[test]
fn env_directives_are_used_verbatim() {
    assert_eq!(
        filter_directives(None, Some("info,themewatch::proxy=debug")),
        "info,themewatch::proxy=debug"
    );
}

#[test]
fn default_is_info() {
    assert!(filter_directives(None, None).starts_with("info,"));
    assert!(filter_directives(None, Some("  ")).starts_with("info,"));
}

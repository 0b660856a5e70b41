#![allow(dead_code)]

pub use themewatch_test_utils::builders;
pub use themewatch_test_utils::{
    init_tracing, with_timeout, FakeExecutor, Notification, RecordingNotifier, RecordingReload,
    SettingsBuilder, ThemeFixture,
};

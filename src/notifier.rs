// src/notifier.rs

//! User-visible task notifications.
//!
//! Pipelines report success messages ("compiled sass", "minified js", ...)
//! and the task runner reports failures. [`LogNotifier`] always prints; the
//! [`DesktopNotifier`] additionally raises an OS notification.

use std::fmt::Debug;
use std::process::{Command, Stdio};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::Settings;

pub trait Notifier: Send + Sync + Debug {
    fn success(&self, task: &str, message: &str);

    /// `error` is rendered as `Error: <error>`.
    fn failure(&self, task: &str, error: &str);
}

pub fn failure_message(error: &str) -> String {
    format!("Error: {error}")
}

/// Prints `[themewatch] <task>: <message>` lines and logs them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, task: &str, message: &str) {
        info!(task, message, "task notification");
        println!("[themewatch] {task}: {message}");
    }

    fn failure(&self, task: &str, error: &str) {
        let message = failure_message(error);
        error!(task, %message, "task failed");
        eprintln!("[themewatch] {task}: {message}");
    }
}

/// Log plus a desktop popup via `notify-send` (Linux) or `osascript` (macOS).
///
/// A missing notifier binary is logged once per message and otherwise
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct DesktopNotifier {
    log: LogNotifier,
}

impl DesktopNotifier {
    fn popup(&self, title: &str, body: &str) {
        let mut cmd = desktop_command(title, body);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        match cmd.status() {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(?status, "desktop notification command failed"),
            Err(err) => warn!(error = %err, "could not run desktop notification command"),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn success(&self, task: &str, message: &str) {
        self.log.success(task, message);
        self.popup(&format!("themewatch: {task}"), message);
    }

    fn failure(&self, task: &str, error: &str) {
        self.log.failure(task, error);
        self.popup(&format!("themewatch: {task}"), &failure_message(error));
    }
}

#[cfg(target_os = "macos")]
fn desktop_command(title: &str, body: &str) -> Command {
    let script = format!(
        "display notification {} with title {}",
        applescript_string(body),
        applescript_string(title)
    );
    let mut cmd = Command::new("osascript");
    cmd.arg("-e").arg(script);
    cmd
}

#[cfg(target_os = "macos")]
fn applescript_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(not(target_os = "macos"))]
fn desktop_command(title: &str, body: &str) -> Command {
    let mut cmd = Command::new("notify-send");
    cmd.arg(title).arg(body);
    cmd
}

pub fn notifier_from_settings(settings: &Settings) -> Arc<dyn Notifier> {
    if settings.notify.desktop {
        Arc::new(DesktopNotifier::default())
    } else {
        Arc::new(LogNotifier)
    }
}

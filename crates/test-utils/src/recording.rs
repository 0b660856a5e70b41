use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use themewatch::engine::ReloadSink;
use themewatch::notifier::Notifier;

/// Counts reload broadcasts.
#[derive(Debug, Clone, Default)]
pub struct RecordingReload {
    count: Arc<AtomicUsize>,
}

impl RecordingReload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ReloadSink for RecordingReload {
    fn reload(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success { task: String, message: String },
    Failure { task: String, error: String },
}

/// Keeps every notification for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Success { message, .. } => Some(message),
                Notification::Failure { .. } => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Failure { error, .. } => Some(error),
                Notification::Success { .. } => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, task: &str, message: &str) {
        self.seen.lock().unwrap().push(Notification::Success {
            task: task.to_string(),
            message: message.to_string(),
        });
    }

    fn failure(&self, task: &str, error: &str) {
        self.seen.lock().unwrap().push(Notification::Failure {
            task: task.to_string(),
            error: error.to_string(),
        });
    }
}

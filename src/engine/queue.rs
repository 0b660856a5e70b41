// src/engine/queue.rs

use std::collections::BTreeSet;

use tracing::debug;

use crate::engine::TaskName;
use crate::types::BusyPolicy;

/// Triggers that arrived while their task was already running.
///
/// With [`BusyPolicy::Queue`] every such trigger for a task collapses into one
/// pending re-run; with [`BusyPolicy::Drop`] nothing is remembered.
#[derive(Debug)]
pub struct TriggerQueue {
    policy: BusyPolicy,
    pending: BTreeSet<TaskName>,
}

impl TriggerQueue {
    pub fn new(policy: BusyPolicy) -> Self {
        Self {
            policy,
            pending: BTreeSet::new(),
        }
    }

    pub fn policy(&self) -> BusyPolicy {
        self.policy
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, task: &str) -> bool {
        self.pending.contains(task)
    }

    /// Record a trigger for a busy task. Returns whether it was kept.
    pub fn record_trigger(&mut self, task: &str) -> bool {
        match self.policy {
            BusyPolicy::Queue => {
                let fresh = self.pending.insert(task.to_string());
                debug!(task, coalesced = !fresh, "queued re-run for busy task");
                true
            }
            BusyPolicy::Drop => {
                debug!(task, "task busy; dropping trigger");
                false
            }
        }
    }

    /// Remove and report the pending re-run for `task`, if any.
    pub fn take(&mut self, task: &str) -> bool {
        self.pending.remove(task)
    }
}

// src/engine/runs.rs

use std::collections::BTreeMap;

use tracing::warn;

use crate::engine::{ScheduledRun, TaskName, TaskOutcome};
use crate::tasks::TaskKind;

/// Bookkeeping for task runs: which tasks exist, which are in flight under
/// which run id, and how finished runs went.
#[derive(Debug, Default)]
pub struct RunBook {
    kinds: BTreeMap<TaskName, TaskKind>,
    in_flight: BTreeMap<TaskName, u64>,
    next_run_id: u64,
    summary: RunSummary,
}

/// Totals over the lifetime of a runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: Vec<TaskName>,
    pub failed: Vec<(TaskName, String)>,
    pub reloads: usize,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl RunBook {
    pub fn new(kinds: BTreeMap<TaskName, TaskKind>) -> Self {
        Self {
            kinds,
            ..Self::default()
        }
    }

    pub fn kind_of(&self, task: &str) -> Option<TaskKind> {
        self.kinds.get(task).copied()
    }

    pub fn is_running(&self, task: &str) -> bool {
        self.in_flight.contains_key(task)
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn running(&self) -> impl Iterator<Item = &str> {
        self.in_flight.keys().map(String::as_str)
    }

    /// Mark `task` as in flight under a fresh run id.
    pub fn start(&mut self, task: &str) -> ScheduledRun {
        self.next_run_id += 1;
        let run_id = self.next_run_id;
        self.in_flight.insert(task.to_string(), run_id);
        ScheduledRun {
            task: task.to_string(),
            run_id,
        }
    }

    /// Record a completion. Returns `false` for a stale or unknown run.
    pub fn finish(&mut self, task: &str, run_id: u64, outcome: TaskOutcome) -> bool {
        match self.in_flight.get(task) {
            Some(&current) if current == run_id => {
                self.in_flight.remove(task);
            }
            other => {
                warn!(task, run_id, current = ?other, "ignoring completion for a run that is not in flight");
                return false;
            }
        }

        match outcome {
            TaskOutcome::Success => self.summary.succeeded.push(task.to_string()),
            TaskOutcome::Failed(message) => self.summary.failed.push((task.to_string(), message)),
        }
        true
    }

    pub fn record_reload(&mut self) {
        self.summary.reloads += 1;
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }
}

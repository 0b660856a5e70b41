// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels, handing runs to the executor, broadcasting reloads
//! and handling shutdown.
//!
//! The core has no Tokio types, channels, filesystem access or processes, so
//! it can be unit tested directly.

use std::collections::BTreeMap;

use crate::engine::event_handlers::{
    check_exit, handle_reload_request, handle_task_completion, handle_task_triggers, CoreStep,
};
use crate::engine::queue::TriggerQueue;
use crate::engine::runs::{RunBook, RunSummary};
use crate::engine::{RuntimeEvent, RuntimeOptions, TaskName, TriggerReason};
use crate::tasks::TaskKind;

#[derive(Debug)]
pub struct CoreRuntime {
    runs: RunBook,
    queue: TriggerQueue,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(kinds: BTreeMap<TaskName, TaskKind>, options: RuntimeOptions) -> Self {
        Self {
            runs: RunBook::new(kinds),
            queue: TriggerQueue::new(options.busy_policy),
            options,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.runs.is_idle()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_running(&self, task: &str) -> bool {
        self.runs.is_running(task)
    }

    pub fn summary(&self) -> &RunSummary {
        self.runs.summary()
    }

    pub fn into_summary(self) -> RunSummary {
        self.runs.into_summary()
    }

    /// Trigger `tasks` together before any other event is processed.
    ///
    /// With `exit_when_idle`, an empty seed (or one made only of reloads)
    /// exits immediately.
    pub fn seed(&mut self, tasks: Vec<TaskName>) -> CoreStep {
        let commands =
            handle_task_triggers(&mut self.runs, &mut self.queue, tasks, TriggerReason::Manual);
        check_exit(&self.runs, &self.queue, &self.options, commands)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        let commands = match event {
            RuntimeEvent::TaskTriggered { task, reason } => {
                handle_task_triggers(&mut self.runs, &mut self.queue, vec![task], reason)
            }
            RuntimeEvent::ReloadRequested { reason } => {
                handle_reload_request(&mut self.runs, reason)
            }
            RuntimeEvent::TaskCompleted {
                task,
                run_id,
                outcome,
            } => handle_task_completion(&mut self.runs, &mut self.queue, task, run_id, outcome),
            RuntimeEvent::ShutdownRequested => return CoreStep::stop(),
        };
        check_exit(&self.runs, &self.queue, &self.options, commands)
    }
}

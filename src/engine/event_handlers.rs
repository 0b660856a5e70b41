// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info, warn};

use crate::engine::queue::TriggerQueue;
use crate::engine::runs::RunBook;
use crate::engine::{RuntimeOptions, ScheduledRun, TaskName, TaskOutcome, TriggerReason};
use crate::tasks::TaskKind;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these runs to the executor.
    DispatchTasks(Vec<ScheduledRun>),
    /// Tell connected browsers to reload.
    BroadcastReload,
    /// Request that the process exits (used by `run` when idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    pub fn stop() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: false,
        }
    }
}

/// Handle a batch of task triggers.
///
/// - Unknown tasks are ignored.
/// - Reload tasks become a single `BroadcastReload`.
/// - Idle pipeline tasks are started; busy ones go through the queue.
pub fn handle_task_triggers(
    runs: &mut RunBook,
    queue: &mut TriggerQueue,
    tasks: Vec<TaskName>,
    reason: TriggerReason,
) -> Vec<CoreCommand> {
    let mut ready = Vec::new();
    let mut reload = false;

    for task in tasks {
        match runs.kind_of(&task) {
            None => warn!(task = %task, "trigger for unknown task ignored"),
            Some(TaskKind::Reload) => reload = true,
            Some(TaskKind::Pipeline) => {
                if runs.is_running(&task) {
                    queue.record_trigger(&task);
                } else if !ready.iter().any(|r: &ScheduledRun| r.task == task) {
                    let run = runs.start(&task);
                    info!(task = %run.task, run_id = run.run_id, ?reason, "starting task");
                    ready.push(run);
                }
            }
        }
    }

    let mut commands = Vec::new();
    if !ready.is_empty() {
        commands.push(CoreCommand::DispatchTasks(ready));
    }
    if reload {
        runs.record_reload();
        commands.push(CoreCommand::BroadcastReload);
    }
    commands
}

pub fn handle_reload_request(runs: &mut RunBook, reason: TriggerReason) -> Vec<CoreCommand> {
    debug!(?reason, "reload requested");
    runs.record_reload();
    vec![CoreCommand::BroadcastReload]
}

/// Handle a run completion; start the queued re-run if there is one.
pub fn handle_task_completion(
    runs: &mut RunBook,
    queue: &mut TriggerQueue,
    task: TaskName,
    run_id: u64,
    outcome: TaskOutcome,
) -> Vec<CoreCommand> {
    match &outcome {
        TaskOutcome::Success => info!(task = %task, run_id, "task finished"),
        TaskOutcome::Failed(message) => warn!(task = %task, run_id, error = %message, "task failed"),
    }

    if !runs.finish(&task, run_id, outcome) {
        return Vec::new();
    }

    if queue.take(&task) {
        let run = runs.start(&task);
        info!(task = %run.task, run_id = run.run_id, "starting queued re-run");
        return vec![CoreCommand::DispatchTasks(vec![run])];
    }

    Vec::new()
}

/// Append `RequestExit` when running with `exit_when_idle` and nothing is
/// running or queued.
pub fn check_exit(
    runs: &RunBook,
    queue: &TriggerQueue,
    options: &RuntimeOptions,
    mut commands: Vec<CoreCommand>,
) -> CoreStep {
    if options.exit_when_idle && runs.is_idle() && queue.is_empty() {
        commands.push(CoreCommand::RequestExit);
        return CoreStep {
            commands,
            keep_running: false,
        };
    }
    CoreStep::continue_with(commands)
}

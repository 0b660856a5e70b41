// src/exec/task_runner.rs

//! Single task runner.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::{RuntimeEvent, ScheduledRun, TaskOutcome};
use crate::fs::FileSystem;
use crate::notifier::Notifier;
use crate::tasks::{TaskAction, TaskRegistry};

/// Run `run` on the blocking pool and report its outcome to the runtime.
pub async fn run_task(
    run: ScheduledRun,
    registry: Arc<TaskRegistry>,
    fs: Arc<dyn FileSystem>,
    notifier: Arc<dyn Notifier>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let task = run.task.clone();
    let run_id = run.run_id;

    let outcome = tokio::task::spawn_blocking(move || {
        execute(&registry, fs.as_ref(), notifier.as_ref(), &run)
    })
    .await
    .unwrap_or_else(|err| {
        error!(task = %task, run_id, error = %err, "task panicked");
        TaskOutcome::Failed(format!("task panicked: {err}"))
    });

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task,
            run_id,
            outcome,
        })
        .await
    {
        warn!("failed to send TaskCompleted: {err}");
    }
}

/// Run a task synchronously. Pipeline failures are reported through
/// `notifier` and returned as `TaskOutcome::Failed`.
pub fn execute(
    registry: &TaskRegistry,
    fs: &dyn FileSystem,
    notifier: &dyn Notifier,
    run: &ScheduledRun,
) -> TaskOutcome {
    let task = run.task.as_str();

    match registry.get(task) {
        Some(TaskAction::Pipeline(pipeline)) => {
            info!(task, run_id = run.run_id, "running pipeline");
            match pipeline.run(fs, notifier) {
                Ok(report) => {
                    debug!(
                        task,
                        run_id = run.run_id,
                        written = ?report.written,
                        "pipeline run complete"
                    );
                    TaskOutcome::Success
                }
                Err(err) => {
                    let message = err.to_string();
                    notifier.failure(task, &message);
                    TaskOutcome::Failed(message)
                }
            }
        }
        Some(TaskAction::Reload) => {
            // Reloads are broadcast by the runtime and never dispatched.
            debug!(task, "reload task dispatched to executor; nothing to do");
            TaskOutcome::Success
        }
        None => {
            let message = format!("unknown task {task:?}");
            notifier.failure(task, &message);
            TaskOutcome::Failed(message)
        }
    }
}

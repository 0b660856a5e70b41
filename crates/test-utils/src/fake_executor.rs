use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use themewatch::engine::{RuntimeEvent, ScheduledRun, TaskOutcome};
use themewatch::errors::{Result, ThemewatchError};
use themewatch::exec::ExecutorBackend;

/// A fake executor that:
/// - records which runs were dispatched
/// - immediately reports `TaskCompleted` for each, with `Success` unless an
///   outcome was configured for the task.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<ScheduledRun>>>,
    outcomes: BTreeMap<String, TaskOutcome>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<ScheduledRun>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            outcomes: BTreeMap::new(),
        }
    }

    pub fn with_outcome(mut self, task: &str, outcome: TaskOutcome) -> Self {
        self.outcomes.insert(task.to_string(), outcome);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        runs: Vec<ScheduledRun>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);

        Box::pin(async move {
            for run in runs {
                executed.lock().unwrap().push(run.clone());

                let outcome = self
                    .outcomes
                    .get(&run.task)
                    .cloned()
                    .unwrap_or(TaskOutcome::Success);

                tx.send(RuntimeEvent::TaskCompleted {
                    task: run.task,
                    run_id: run.run_id,
                    outcome,
                })
                .await
                .map_err(|e| ThemewatchError::Other(e.into()))?;
            }
            Ok(())
        })
    }
}

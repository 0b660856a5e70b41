// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::{ReloadSink, RunSummary, ScheduledRun, TaskName};
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, CoreStep, RuntimeEvent};

/// Async IO shell around [`CoreRuntime`].
///
/// Reads `RuntimeEvent`s, feeds them to the core, and carries out the
/// resulting commands: runs go to the `ExecutorBackend`, reloads to the
/// `ReloadSink`.
pub struct Runtime<E: ExecutorBackend, R: ReloadSink> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    reload: R,
}

impl<E: ExecutorBackend, R: ReloadSink> fmt::Debug for Runtime<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend, R: ReloadSink> Runtime<E, R> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        executor: E,
        reload: R,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
            reload,
        }
    }

    /// Main event loop.
    ///
    /// Triggers `initial` first, then processes events until the core asks
    /// to stop or the channel closes.
    pub async fn run(mut self, initial: Vec<TaskName>) -> Result<RunSummary> {
        info!(?initial, "themewatch runtime started");

        let seeded = self.core.seed(initial);
        let mut keep_running = self.apply(seeded).await?;

        while keep_running {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");
            let step = self.core.step(event);
            keep_running = self.apply(step).await?;
        }

        let summary = self.core.into_summary();
        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            reloads = summary.reloads,
            "runtime exiting"
        );
        Ok(summary)
    }

    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        for command in step.commands {
            self.execute_command(command).await?;
        }
        if !step.keep_running {
            info!("core requested exit; stopping runtime");
        }
        Ok(step.keep_running)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(runs) => self.spawn_ready(runs).await?,
            CoreCommand::BroadcastReload => self.reload.reload(),
            CoreCommand::RequestExit => debug!("core issued RequestExit"),
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, runs: Vec<ScheduledRun>) -> Result<()> {
        if runs.is_empty() {
            return Ok(());
        }
        let names: Vec<_> = runs.iter().map(|r| r.task.as_str()).collect();
        debug!(?names, "dispatching runs");
        self.executor.spawn_ready_tasks(runs).await
    }
}

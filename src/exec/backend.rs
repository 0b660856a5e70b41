// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of running pipelines
//! itself. Tests provide their own backend that records dispatched runs and
//! emits `TaskCompleted` events on demand.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::{RuntimeEvent, ScheduledRun};
use crate::errors::Result;
use crate::exec::task_runner::run_task;
use crate::fs::FileSystem;
use crate::notifier::Notifier;
use crate::tasks::TaskRegistry;

pub trait ExecutorBackend: Send {
    /// Start the given runs. Each run must eventually produce exactly one
    /// `RuntimeEvent::TaskCompleted`.
    fn spawn_ready_tasks(
        &mut self,
        runs: Vec<ScheduledRun>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Runs registry tasks on Tokio's blocking pool, one spawned task per run.
pub struct RealExecutorBackend {
    registry: Arc<TaskRegistry>,
    fs: Arc<dyn FileSystem>,
    notifier: Arc<dyn Notifier>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl RealExecutorBackend {
    pub fn new(
        registry: Arc<TaskRegistry>,
        fs: Arc<dyn FileSystem>,
        notifier: Arc<dyn Notifier>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            registry,
            fs,
            notifier,
            runtime_tx,
        }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        runs: Vec<ScheduledRun>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for run in runs {
                tokio::spawn(run_task(
                    run,
                    Arc::clone(&self.registry),
                    Arc::clone(&self.fs),
                    Arc::clone(&self.notifier),
                    self.runtime_tx.clone(),
                ));
            }
            Ok(())
        })
    }
}

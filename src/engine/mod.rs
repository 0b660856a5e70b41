// src/engine/mod.rs

//! Orchestration engine for themewatch.
//!
//! This module ties together:
//! - the per-task run book (what is in flight, run ids, outcomes)
//! - the trigger queue (what happens when a task is triggered while running)
//! - the main runtime event loop that reacts to:
//!   - file-watch triggers
//!   - reload requests
//!   - task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(String),
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Explicit invocation (`themewatch run`, startup).
    Manual,
    /// A watched file changed.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Exit once nothing is running or queued (used by `themewatch run`).
    pub exit_when_idle: bool,
    pub busy_policy: BusyPolicy,
}

/// Events flowing into the runtime from the watcher, executor, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task should be run.
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    /// Connected browsers should reload.
    ReloadRequested { reason: TriggerReason },
    /// A run finished.
    TaskCompleted {
        task: TaskName,
        run_id: u64,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// A single run handed to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRun {
    pub task: TaskName,
    pub run_id: u64,
}

/// Receiver of full-page reload requests (the dev proxy in production).
pub trait ReloadSink: Send + Sync {
    fn reload(&self);
}

/// Reload sink for `themewatch watch`, where no browser is connected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReload;

impl ReloadSink for NoopReload {
    fn reload(&self) {
        tracing::debug!("reload requested but no proxy is running");
    }
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runs;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runs::{RunBook, RunSummary};
pub use runtime::Runtime;
pub use crate::types::BusyPolicy;

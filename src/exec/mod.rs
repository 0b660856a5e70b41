// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`task_runner`] runs a single registry task on the blocking pool and
//!   reports a `TaskCompleted` event back to the runtime.
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `RealExecutorBackend` used in production; tests swap in a fake.

pub mod backend;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use task_runner::{execute, run_task};

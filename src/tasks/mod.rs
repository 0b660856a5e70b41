// src/tasks/mod.rs

//! Named tasks.
//!
//! - `registry.rs`: the name → action table.
//! - `theme.rs`: the WordPress theme tasks and default watch bindings.

pub mod registry;
pub mod theme;

pub use registry::{TaskAction, TaskKind, TaskRegistry};
pub use theme::{
    theme_registry, theme_watch_bindings, IMAGEMIN_TASK, JS_TASK, RELOAD_TASK, SASS_TASK,
};

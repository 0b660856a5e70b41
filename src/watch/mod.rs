// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling the (glob pattern, target) watch table.
//! - Wiring up a debounced filesystem watcher (`notify-debouncer-mini`).
//! - Skipping paths whose content hash did not change.
//! - Turning each debounced batch into de-duplicated runtime events.
//!
//! It does not run anything itself; it only feeds the engine.

pub mod cache;
pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use cache::FileCache;
pub use event_handler::{dispatch_targets, filter_batch};
pub use patterns::{WatchBinding, WatchTable, WatchTarget};
pub use watcher::{spawn_watcher, WatcherHandle, WatcherOptions};

// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, Debouncer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::WatchSection;
use crate::engine::RuntimeEvent;
use crate::errors::{Result, ThemewatchError};
use crate::fs::FileSystem;
use crate::pipeline::source::collect_matching_files;
use crate::watch::cache::FileCache;
use crate::watch::event_handler::{dispatch_targets, filter_batch};
use crate::watch::patterns::WatchTable;

#[derive(Debug, Clone, Copy)]
pub struct WatcherOptions {
    pub debounce: Duration,
    pub skip_unchanged: bool,
}

impl WatcherOptions {
    pub fn from_settings(watch: &WatchSection) -> Self {
        Self {
            debounce: Duration::from_millis(watch.debounce_ms),
            skip_unchanged: watch.skip_unchanged,
        }
    }
}

/// Keeps the debouncer alive. Dropping this handle stops file watching.
pub struct WatcherHandle {
    _debouncer: Debouncer<RecommendedWatcher>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish_non_exhaustive()
    }
}

/// Watch `root` recursively and feed matching batches to the runtime as
/// `TaskTriggered` / `ReloadRequested` events.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    table: WatchTable,
    options: WatcherOptions,
    fs: Arc<dyn FileSystem>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = fs.canonicalize(&root).unwrap_or(root);
    let table = Arc::new(table);

    let cache = if options.skip_unchanged {
        let mut cache = FileCache::new();
        let watched = collect_matching_files(fs.as_ref(), &root, &root, |rel| {
            table.matches_any(rel)
        })?;
        cache.prime(fs.as_ref(), watched);
        Some(Arc::new(Mutex::new(cache)))
    } else {
        None
    };

    let (batch_tx, mut batch_rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();

    let mut debouncer = new_debouncer(
        options.debounce,
        move |res: std::result::Result<Vec<DebouncedEvent>, notify::Error>| match res {
            Ok(events) => {
                let paths = events.into_iter().map(|e| e.path).collect();
                if let Err(err) = batch_tx.send(paths) {
                    eprintln!("themewatch: failed to forward watch batch: {err}");
                }
            }
            Err(err) => {
                eprintln!("themewatch: file watch error: {err}");
            }
        },
    )
    .map_err(|e| ThemewatchError::Other(e.into()))?;

    debouncer
        .watcher()
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| ThemewatchError::Other(e.into()))?;

    info!(
        root = ?root,
        debounce_ms = options.debounce.as_millis() as u64,
        skip_unchanged = options.skip_unchanged,
        "file watcher started"
    );

    let task = tokio::spawn(async move {
        while let Some(paths) = batch_rx.recv().await {
            debug!(count = paths.len(), "received debounced batch");

            let fs = Arc::clone(&fs);
            let root = root.clone();
            let table = Arc::clone(&table);
            let cache = cache.clone();

            // Hashing reads files; keep it off the async workers.
            let targets = tokio::task::spawn_blocking(move || {
                let mut guard = cache.as_ref().map(|c| match c.lock() {
                    Ok(g) => g,
                    Err(poisoned) => poisoned.into_inner(),
                });
                filter_batch(fs.as_ref(), &root, &paths, &table, guard.as_deref_mut())
            })
            .await;

            let targets = match targets {
                Ok(t) => t,
                Err(err) => {
                    warn!("watch batch processing panicked: {err}");
                    continue;
                }
            };

            if !dispatch_targets(targets, &runtime_tx).await {
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _debouncer: debouncer,
        task,
    })
}

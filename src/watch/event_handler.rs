// src/watch/event_handler.rs

//! Turning a debounced batch of changed paths into runtime events.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::fs::FileSystem;
use crate::watch::cache::FileCache;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{WatchTable, WatchTarget};

/// Reduce a batch of changed absolute paths to the targets it should fire.
///
/// 1. Paths outside `root` or matching no binding are ignored.
/// 2. With a `cache`, paths whose content hash is unchanged are ignored.
/// 3. The remaining paths resolve to de-duplicated targets.
pub fn filter_batch(
    fs: &dyn FileSystem,
    root: &Path,
    paths: &[PathBuf],
    table: &WatchTable,
    mut cache: Option<&mut FileCache>,
) -> Vec<WatchTarget> {
    let unique: BTreeSet<&PathBuf> = paths.iter().collect();
    let mut changed = Vec::with_capacity(unique.len());

    for path in unique {
        let Some(rel) = relative_str(root, path) else {
            debug!(?path, ?root, "changed path is outside the theme root");
            continue;
        };

        if !table.matches_any(&rel) {
            continue;
        }

        if let Some(cache) = cache.as_deref_mut() {
            if !cache.observe(fs, path) {
                debug!(path = %rel, "content unchanged; ignoring");
                continue;
            }
        }

        changed.push(rel);
    }

    let targets = table.resolve_batch(&changed);
    if !targets.is_empty() {
        info!(paths = ?changed, targets = ?targets, "watch batch matched");
    }
    targets
}

/// Send one runtime event per target. Returns `false` once the runtime has
/// gone away.
pub async fn dispatch_targets(
    targets: Vec<WatchTarget>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> bool {
    for target in targets {
        let event = match target {
            WatchTarget::Task(task) => RuntimeEvent::TaskTriggered {
                task,
                reason: TriggerReason::FileWatch,
            },
            WatchTarget::Reload => RuntimeEvent::ReloadRequested {
                reason: TriggerReason::FileWatch,
            },
        };
        if let Err(err) = runtime_tx.send(event).await {
            warn!("failed to forward watch trigger: {err}");
            return false;
        }
    }
    true
}

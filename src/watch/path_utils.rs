// src/watch/path_utils.rs

//! Path helpers for the watcher.

use std::path::Path;

/// Convert `path` into a string relative to `root`, with forward slashes.
///
/// Tries a plain `strip_prefix` first, then canonicalizes both sides (event
/// paths on macOS come back as `/private/var/...` for `/var/...` roots).
/// A deleted file cannot be canonicalized, so its parent is canonicalized
/// instead.
///
/// Returns `None` if the path is not under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(forward_slashes(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = path.canonicalize().ok().or_else(|| {
        let parent = path.parent()?.canonicalize().ok()?;
        Some(parent.join(path.file_name()?))
    })?;

    path_canon
        .strip_prefix(&root_canon)
        .ok()
        .map(forward_slashes)
}

fn forward_slashes(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

// src/watch/cache.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::watch::hash::compute_file_hash;

/// Last seen content hash per path.
///
/// Editors and idempotent rebuilds often touch files without changing them;
/// [`FileCache::observe`] tells those apart from real edits.
#[derive(Debug, Default)]
pub struct FileCache {
    hashes: HashMap<PathBuf, String>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current hash of every path in `paths`.
    pub fn prime<I>(&mut self, fs: &dyn FileSystem, paths: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        for path in paths {
            match compute_file_hash(fs, &path) {
                Ok(hash) => {
                    self.hashes.insert(path, hash);
                }
                Err(err) => debug!(?path, error = %err, "could not prime hash"),
            }
        }
        debug!(entries = self.hashes.len(), "primed file hash cache");
    }

    /// Re-hash `path` and report whether its content changed since the last
    /// observation. Missing files always count as changed.
    pub fn observe(&mut self, fs: &dyn FileSystem, path: &Path) -> bool {
        if !fs.is_file(path) {
            self.hashes.remove(path);
            return true;
        }

        let hash = match compute_file_hash(fs, path) {
            Ok(h) => h,
            Err(err) => {
                warn!(?path, error = %err, "failed to hash changed file; treating as changed");
                self.hashes.remove(path);
                return true;
            }
        };

        let changed = self.hashes.get(path) != Some(&hash);
        self.hashes.insert(path.to_path_buf(), hash);
        changed
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

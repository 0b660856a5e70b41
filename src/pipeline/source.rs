// src/pipeline/source.rs

//! Glob resolution shared by pipelines, the Sass glob importer and the watcher.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};

use crate::fs::FileSystem;
use crate::pipeline::{PipelineError, SourceFile};

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Compile a single glob where `*` and `?` never match `/`.
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))?;
    Ok(glob.compile_matcher())
}

pub fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(GLOB_META)
}

/// The leading directory components of `pattern` that contain no glob
/// metacharacters: `sass/*.scss` → `sass`, `**/*.php` → ``.
pub fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let mut parts = pattern.split('/').peekable();
    while let Some(part) = parts.next() {
        // The last component is the file pattern, never part of the base.
        if parts.peek().is_none() || has_glob_meta(part) {
            break;
        }
        base.push(part);
    }
    base
}

/// Walk `start` recursively and return every file whose path relative to
/// `root` (forward slashes) satisfies `is_match`, sorted.
pub fn collect_matching_files<F>(
    fs: &dyn FileSystem,
    root: &Path,
    start: &Path,
    is_match: F,
) -> Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let mut files = Vec::new();
    if !fs.is_dir(start) {
        return Ok(files);
    }

    let mut stack = vec![start.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if is_match(&rel_str) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// A glob pattern evaluated against a root directory.
#[derive(Clone)]
pub struct GlobSource {
    root: PathBuf,
    pattern: String,
    base: PathBuf,
    matcher: GlobMatcher,
}

impl std::fmt::Debug for GlobSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobSource")
            .field("root", &self.root)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl GlobSource {
    /// `pattern` is relative to `root`, with forward slashes.
    pub fn new(root: impl Into<PathBuf>, pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let matcher = compile_glob(&pattern)?;
        Ok(Self {
            root: root.into(),
            base: glob_base(&pattern),
            pattern,
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Absolute directory that `SourceFile::relative` is relative to.
    pub fn base_dir(&self) -> PathBuf {
        self.root.join(&self.base)
    }

    pub fn is_match(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }

    /// Read every matching file. A missing base directory matches nothing.
    pub fn resolve(&self, fs: &dyn FileSystem) -> Result<Vec<SourceFile>, PipelineError> {
        let source_err = |err: anyhow::Error| PipelineError::Source {
            pattern: self.pattern.clone(),
            message: format!("{err:#}"),
        };

        let base_dir = self.base_dir();
        let paths = collect_matching_files(fs, &self.root, &base_dir, |rel| self.is_match(rel))
            .map_err(source_err)?;

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let contents = fs.read(&path).map_err(source_err)?;
            let relative = path
                .strip_prefix(&base_dir)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()));
            files.push(SourceFile::new(&base_dir, relative, contents));
        }
        Ok(files)
    }
}

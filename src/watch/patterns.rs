// src/watch/patterns.rs

use std::fmt;

use anyhow::Context;
use globset::GlobMatcher;

use crate::engine::TaskName;
use crate::errors::{Result, ThemewatchError};
use crate::pipeline::source::compile_glob;
use crate::tasks::TaskRegistry;

/// What a matching change invokes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WatchTarget {
    Task(TaskName),
    Reload,
}

impl WatchTarget {
    pub fn task(name: impl Into<TaskName>) -> Self {
        WatchTarget::Task(name.into())
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchTarget::Task(name) => write!(f, "task {name}"),
            WatchTarget::Reload => f.write_str("reload"),
        }
    }
}

/// A glob pattern, relative to the theme root, bound to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchBinding {
    pub pattern: String,
    pub target: WatchTarget,
}

impl WatchBinding {
    pub fn new(pattern: impl Into<String>, target: WatchTarget) -> Self {
        Self {
            pattern: pattern.into(),
            target,
        }
    }
}

#[derive(Clone)]
struct CompiledBinding {
    binding: WatchBinding,
    matcher: GlobMatcher,
}

/// Compiled watch bindings.
///
/// Paths passed to the matching methods are relative to the theme root and
/// use forward slashes (e.g. `"sass/base/_type.scss"`).
#[derive(Clone, Default)]
pub struct WatchTable {
    bindings: Vec<CompiledBinding>,
}

impl fmt::Debug for WatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.bindings.iter().map(|b| &b.binding))
            .finish()
    }
}

impl WatchTable {
    /// Compile `bindings`. Every task target must exist in `registry`.
    pub fn compile(bindings: Vec<WatchBinding>, registry: &TaskRegistry) -> Result<Self> {
        let mut compiled = Vec::with_capacity(bindings.len());
        for binding in bindings {
            if let WatchTarget::Task(name) = &binding.target {
                if !registry.contains(name) {
                    return Err(ThemewatchError::TaskNotFound(name.clone()));
                }
            }
            let matcher = compile_glob(&binding.pattern)
                .with_context(|| format!("watch pattern {:?}", binding.pattern))?;
            compiled.push(CompiledBinding { binding, matcher });
        }
        Ok(Self { bindings: compiled })
    }

    pub fn bindings(&self) -> impl Iterator<Item = &WatchBinding> {
        self.bindings.iter().map(|b| &b.binding)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn matches_any(&self, rel_path: &str) -> bool {
        self.bindings.iter().any(|b| b.matcher.is_match(rel_path))
    }

    /// Targets bound to patterns matching `rel_path`, in binding order.
    pub fn targets_for<'a>(&'a self, rel_path: &'a str) -> impl Iterator<Item = &'a WatchTarget> {
        self.bindings
            .iter()
            .filter(move |b| b.matcher.is_match(rel_path))
            .map(|b| &b.binding.target)
    }

    /// Every target hit by at least one path, each exactly once, in order of
    /// first appearance.
    pub fn resolve_batch<S: AsRef<str>>(&self, rel_paths: &[S]) -> Vec<WatchTarget> {
        let mut out: Vec<WatchTarget> = Vec::new();
        for rel in rel_paths {
            for target in self.targets_for(rel.as_ref()) {
                if !out.contains(target) {
                    out.push(target.clone());
                }
            }
        }
        out
    }
}

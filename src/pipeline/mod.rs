// src/pipeline/mod.rs

//! Glob-sourced file pipelines.
//!
//! A [`Pipeline`] resolves its [`GlobSource`] into in-memory [`SourceFile`]s
//! and threads them through an ordered list of [`Step`]s:
//!
//! - [`Step::Transform`] replaces the stream with the output of a [`Stage`],
//! - [`Step::Dest`] records every file of the current stream for writing
//!   under a destination directory,
//! - [`Step::Notify`] records a success message.
//!
//! Nothing touches the disk until every stage has succeeded; only then are the
//! recorded writes committed (unchanged outputs are skipped) and the
//! notifications emitted. A failing stage therefore leaves previously
//! generated outputs untouched.

pub mod source;
pub mod stages;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::fs::FileSystem;
use crate::notifier::Notifier;

pub use source::GlobSource;
pub use stages::Stage;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("resolving {pattern}: {message}")]
    Source { pattern: String, message: String },

    #[error("{stage} failed on {path:?}: {message}")]
    Stage {
        stage: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("writing {path:?}: {message}")]
    Write { path: PathBuf, message: String },
}

impl PipelineError {
    pub fn stage(stage: &'static str, path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        PipelineError::Stage {
            stage,
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// A file flowing through a pipeline.
///
/// `relative` is relative to `base`, the non-glob prefix of the source
/// pattern; destinations write to `dest.join(relative)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub base: PathBuf,
    pub relative: PathBuf,
    pub contents: Vec<u8>,
}

impl SourceFile {
    pub fn new(base: impl Into<PathBuf>, relative: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            base: base.into(),
            relative: relative.into(),
            contents,
        }
    }

    /// Where this file would live on disk under its original base.
    pub fn path(&self) -> PathBuf {
        self.base.join(&self.relative)
    }

    pub fn file_name(&self) -> String {
        self.relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lower-cased extension, without the dot.
    pub fn extension(&self) -> String {
        self.relative
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// Contents as UTF-8, or a stage error naming `stage`.
    pub fn text(&self, stage: &'static str) -> Result<&str, PipelineError> {
        std::str::from_utf8(&self.contents)
            .map_err(|err| PipelineError::stage(stage, self.path(), format!("not UTF-8: {err}")))
    }
}

#[derive(Debug)]
pub enum Step {
    Transform(Box<dyn Stage>),
    Dest(PathBuf),
    Notify(String),
}

/// What a committed run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub task: String,
    pub inputs: usize,
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct Pipeline {
    name: String,
    source: GlobSource,
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, source: GlobSource) -> Self {
        Self {
            name: name.into(),
            source,
            steps: Vec::new(),
        }
    }

    pub fn pipe(mut self, stage: impl Stage + 'static) -> Self {
        self.steps.push(Step::Transform(Box::new(stage)));
        self
    }

    pub fn dest(mut self, dir: impl Into<PathBuf>) -> Self {
        self.steps.push(Step::Dest(dir.into()));
        self
    }

    pub fn notify(mut self, message: impl Into<String>) -> Self {
        self.steps.push(Step::Notify(message.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &GlobSource {
        &self.source
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run the pipeline to completion.
    ///
    /// Errors are returned before any write happens if they come from
    /// resolving or transforming; `PipelineError::Write` can still leave
    /// earlier destinations of the same run updated.
    pub fn run(
        &self,
        fs: &dyn FileSystem,
        notifier: &dyn Notifier,
    ) -> Result<RunReport, PipelineError> {
        let mut files = self.source.resolve(fs)?;
        let inputs = files.len();
        debug!(task = %self.name, inputs, "resolved pipeline sources");

        // Later writes to the same path win.
        let mut planned: BTreeMap<PathBuf, Vec<u8>> = BTreeMap::new();
        let mut messages = Vec::new();

        for step in &self.steps {
            match step {
                Step::Transform(stage) => {
                    files = stage.apply(files)?;
                    debug!(task = %self.name, stage = stage.name(), files = files.len(), "stage done");
                }
                Step::Dest(dir) => {
                    for file in &files {
                        planned.insert(dir.join(&file.relative), file.contents.clone());
                    }
                }
                Step::Notify(message) => {
                    if !files.is_empty() {
                        messages.push(message.clone());
                    }
                }
            }
        }

        let report = commit(fs, &self.name, inputs, planned)?;
        info!(
            task = %self.name,
            inputs = report.inputs,
            written = report.written.len(),
            unchanged = report.unchanged.len(),
            "pipeline committed"
        );

        for message in messages {
            notifier.success(&self.name, &message);
        }

        Ok(report)
    }
}

fn commit(
    fs: &dyn FileSystem,
    task: &str,
    inputs: usize,
    planned: BTreeMap<PathBuf, Vec<u8>>,
) -> Result<RunReport, PipelineError> {
    let mut report = RunReport {
        task: task.to_string(),
        inputs,
        ..RunReport::default()
    };

    for (path, contents) in planned {
        if is_unchanged(fs, &path, &contents) {
            debug!(task, path = ?path, "output unchanged; not rewriting");
            report.unchanged.push(path);
            continue;
        }
        fs.write(&path, &contents).map_err(|err| PipelineError::Write {
            path: path.clone(),
            message: format!("{err:#}"),
        })?;
        debug!(task, path = ?path, bytes = contents.len(), "wrote output");
        report.written.push(path);
    }

    Ok(report)
}

fn is_unchanged(fs: &dyn FileSystem, path: &Path, contents: &[u8]) -> bool {
    fs.is_file(path)
        && fs
            .read(path)
            .map(|existing| existing == contents)
            .unwrap_or(false)
}

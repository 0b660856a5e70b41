// src/pipeline/stages/mod.rs

//! Transform stages.
//!
//! Each stage consumes the whole stream and returns a new one. Stages that
//! work file-by-file use [`map_each`]; a stage may also drop files (Sass
//! partials) or rename them.

pub mod css;
pub mod images;
pub mod js;
pub mod rename;
pub mod sass;
pub mod sort;

use std::fmt::Debug;

use crate::pipeline::{PipelineError, SourceFile};

pub use css::MinifyCss;
pub use images::CompressImages;
pub use js::MinifyJs;
pub use rename::Rename;
pub use sass::{CompileSass, SassGlobImports};
pub use sort::SortDeclarations;

pub trait Stage: Send + Sync + Debug {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    fn apply(&self, files: Vec<SourceFile>) -> Result<Vec<SourceFile>, PipelineError>;
}

/// Apply `f` to every file; `Ok(None)` drops the file from the stream.
pub fn map_each<F>(files: Vec<SourceFile>, mut f: F) -> Result<Vec<SourceFile>, PipelineError>
where
    F: FnMut(SourceFile) -> Result<Option<SourceFile>, PipelineError>,
{
    let mut out = Vec::with_capacity(files.len());
    for file in files {
        if let Some(file) = f(file)? {
            out.push(file);
        }
    }
    Ok(out)
}

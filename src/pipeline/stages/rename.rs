// src/pipeline/stages/rename.rs

use crate::pipeline::stages::{map_each, Stage};
use crate::pipeline::{PipelineError, SourceFile};

/// Replace the final extension: `Rename::extname(".min.css")` turns
/// `style.css` into `style.min.css`.
#[derive(Debug, Clone)]
pub struct Rename {
    extname: String,
}

impl Rename {
    pub fn extname(extname: impl Into<String>) -> Self {
        let extname = extname.into();
        Self {
            extname: extname.trim_start_matches('.').to_string(),
        }
    }
}

impl Stage for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn apply(&self, files: Vec<SourceFile>) -> Result<Vec<SourceFile>, PipelineError> {
        map_each(files, |mut file| {
            file.relative = file.relative.with_extension(&self.extname);
            Ok(Some(file))
        })
    }
}

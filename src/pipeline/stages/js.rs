// src/pipeline/stages/js.rs

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::pipeline::stages::{map_each, Stage};
use crate::pipeline::{PipelineError, SourceFile};

/// Minify JavaScript: parse with `oxc_parser`, print with `oxc_codegen` in
/// minified mode. A parse error fails the stage.
#[derive(Debug, Clone, Default)]
pub struct MinifyJs;

impl Stage for MinifyJs {
    fn name(&self) -> &'static str {
        "minify-js"
    }

    fn apply(&self, files: Vec<SourceFile>) -> Result<Vec<SourceFile>, PipelineError> {
        map_each(files, |mut file| {
            let path = file.path();
            let minified = minify_js(file.text(self.name())?, &path)
                .map_err(|message| PipelineError::stage(self.name(), &path, message))?;
            file.contents = minified.into_bytes();
            Ok(Some(file))
        })
    }
}

pub fn minify_js(source: &str, path: &Path) -> Result<String, String> {
    let source_type = SourceType::from_path(path).unwrap_or_default();
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, source_type).parse();

    if let Some(err) = parsed.errors.first() {
        return Err(err.to_string());
    }
    if parsed.panicked {
        return Err("parser gave up on this file".to_string());
    }

    let printed = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            ..CodegenOptions::default()
        })
        .build(&parsed.program);
    Ok(printed.code)
}

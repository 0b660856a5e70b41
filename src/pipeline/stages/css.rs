// src/pipeline/stages/css.rs

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

use crate::pipeline::stages::{map_each, Stage};
use crate::pipeline::{PipelineError, SourceFile};

/// Minify CSS with `lightningcss`.
#[derive(Debug, Clone, Default)]
pub struct MinifyCss;

impl Stage for MinifyCss {
    fn name(&self) -> &'static str {
        "minify-css"
    }

    fn apply(&self, files: Vec<SourceFile>) -> Result<Vec<SourceFile>, PipelineError> {
        map_each(files, |mut file| {
            let filename = file.relative.to_string_lossy().into_owned();
            let minified = minify_css(file.text(self.name())?, &filename)
                .map_err(|message| PipelineError::stage(self.name(), file.path(), message))?;
            file.contents = minified.into_bytes();
            Ok(Some(file))
        })
    }
}

/// Parse, minify and print `source`. Errors carry `filename` and position.
pub fn minify_css(source: &str, filename: &str) -> Result<String, String> {
    let options = ParserOptions {
        filename: filename.to_string(),
        ..ParserOptions::default()
    };
    let mut sheet = StyleSheet::parse(source, options).map_err(|e| e.to_string())?;
    sheet
        .minify(MinifyOptions::default())
        .map_err(|e| e.to_string())?;
    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(printed.code)
}

// src/pipeline/stages/images.rs

//! Image compression.
//!
//! - PNG: lossless recompression with `oxipng`.
//! - JPEG: re-encoded with `image` at the configured quality.
//! - SVG: comments and inter-tag whitespace stripped.
//! - anything else (GIF): passed through.
//!
//! The smaller of original and recompressed bytes is kept, so compressing an
//! already-compressed image never grows it.

use std::sync::LazyLock;

use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use regex::Regex;
use tracing::debug;

use crate::config::ImagesSection;
use crate::pipeline::stages::{map_each, Stage};
use crate::pipeline::{PipelineError, SourceFile};

static SVG_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("svg comment regex is valid"));
static SVG_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("svg gap regex is valid"));

#[derive(Debug, Clone)]
pub struct CompressImages {
    jpeg_quality: u8,
    png_preset: u8,
}

impl CompressImages {
    pub fn new(settings: &ImagesSection) -> Self {
        Self {
            jpeg_quality: settings.jpeg_quality,
            png_preset: settings.png_preset,
        }
    }

    fn compress(&self, file: &SourceFile) -> Result<Option<Vec<u8>>, String> {
        match file.extension().as_str() {
            "png" => {
                let options = oxipng::Options::from_preset(self.png_preset);
                oxipng::optimize_from_memory(&file.contents, &options)
                    .map(Some)
                    .map_err(|e| e.to_string())
            }
            "jpg" | "jpeg" => {
                let img = image::load_from_memory_with_format(&file.contents, ImageFormat::Jpeg)
                    .map_err(|e| e.to_string())?;
                let mut buf = Vec::new();
                let encoder = JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality);
                img.write_with_encoder(encoder).map_err(|e| e.to_string())?;
                Ok(Some(buf))
            }
            "svg" => {
                let text = std::str::from_utf8(&file.contents).map_err(|e| e.to_string())?;
                Ok(Some(minify_svg(text).into_bytes()))
            }
            _ => Ok(None),
        }
    }
}

impl Stage for CompressImages {
    fn name(&self) -> &'static str {
        "imagemin"
    }

    fn apply(&self, files: Vec<SourceFile>) -> Result<Vec<SourceFile>, PipelineError> {
        map_each(files, |mut file| {
            let compressed = self
                .compress(&file)
                .map_err(|message| PipelineError::stage(self.name(), file.path(), message))?;

            if let Some(bytes) = compressed {
                let before = file.contents.len();
                if bytes.len() < before {
                    debug!(file = ?file.relative, before, after = bytes.len(), "image compressed");
                    file.contents = bytes;
                } else {
                    debug!(file = ?file.relative, before, "recompression did not help; keeping original");
                }
            }
            Ok(Some(file))
        })
    }
}

pub fn minify_svg(svg: &str) -> String {
    let without_comments = SVG_COMMENT_RE.replace_all(svg, "");
    SVG_GAP_RE
        .replace_all(&without_comments, "><")
        .trim()
        .to_string()
}

// src/pipeline/stages/sass.rs

//! SCSS support: glob `@import` expansion and compilation with `grass`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use grass::{Options, OutputStyle};
use regex::Regex;
use tracing::debug;

use crate::fs::FileSystem;
use crate::pipeline::source::{collect_matching_files, compile_glob, glob_base, has_glob_meta};
use crate::pipeline::stages::{map_each, Stage};
use crate::pipeline::{PipelineError, SourceFile};

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@import\s+(?:"([^"]*)"|'([^']*)')\s*;"#).expect("import regex is valid")
});

/// Expands `@import "foundation/**/*.scss";` into one `@import` per match.
///
/// Matches are resolved relative to the importing file's directory and
/// sorted; the importing file itself is never included. Imports without
/// glob metacharacters pass through untouched.
#[derive(Debug, Clone)]
pub struct SassGlobImports {
    fs: Arc<dyn FileSystem>,
}

impl SassGlobImports {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    fn expand(&self, file: &SourceFile) -> Result<String, PipelineError> {
        let source = file.text(self.name())?;
        let path = file.path();
        let dir = path.parent().unwrap_or(Path::new("")).to_path_buf();

        let mut out = String::with_capacity(source.len());
        let mut last = 0;

        for caps in IMPORT_RE.captures_iter(source) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(target) = caps.get(1).or_else(|| caps.get(2)) else {
                continue;
            };
            if !has_glob_meta(target.as_str()) {
                continue;
            }

            out.push_str(&source[last..whole.start()]);
            let imports = self.resolve_glob(&dir, &path, target.as_str())?;
            debug!(file = ?path, pattern = target.as_str(), matches = imports.len(), "expanded glob import");
            let lines: Vec<String> = imports
                .iter()
                .map(|import| format!("@import \"{import}\";"))
                .collect();
            out.push_str(&lines.join("\n"));
            last = whole.end();
        }

        out.push_str(&source[last..]);
        Ok(out)
    }

    fn resolve_glob(
        &self,
        dir: &Path,
        importer: &Path,
        pattern: &str,
    ) -> Result<Vec<String>, PipelineError> {
        let stage_err = |err: anyhow::Error| PipelineError::stage(self.name(), importer, format!("{err:#}"));

        let matcher = compile_glob(pattern).map_err(stage_err)?;
        let start = dir.join(glob_base(pattern));
        let paths = collect_matching_files(self.fs.as_ref(), dir, &start, |rel| matcher.is_match(rel))
            .map_err(stage_err)?;

        Ok(paths
            .iter()
            .filter(|p| p.as_path() != importer)
            .filter_map(|p| p.strip_prefix(dir).ok())
            .map(|rel| rel.to_string_lossy().replace('\\', "/"))
            .collect())
    }
}

impl Stage for SassGlobImports {
    fn name(&self) -> &'static str {
        "sass-glob"
    }

    fn apply(&self, files: Vec<SourceFile>) -> Result<Vec<SourceFile>, PipelineError> {
        map_each(files, |mut file| {
            if file.extension() == "scss" {
                file.contents = self.expand(&file)?.into_bytes();
            }
            Ok(Some(file))
        })
    }
}

/// Adapter that lets `grass` read through our `FileSystem`.
///
/// The entry file is served from the in-memory stream (it may already have
/// been rewritten by earlier stages); everything it imports comes from disk.
#[derive(Debug)]
struct SassFs<'a> {
    fs: &'a dyn FileSystem,
    entry: &'a Path,
    entry_contents: &'a [u8],
}

impl grass::Fs for SassFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.fs.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path == self.entry || self.fs.is_file(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        if path == self.entry {
            return Ok(self.entry_contents.to_vec());
        }
        self.fs
            .read(path)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{e:#}")))
    }
}

/// Compiles `.scss` to expanded CSS. Partials (`_name.scss`) are dropped
/// from the stream; they only exist to be imported.
#[derive(Debug, Clone)]
pub struct CompileSass {
    fs: Arc<dyn FileSystem>,
    load_paths: Vec<PathBuf>,
}

impl CompileSass {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            load_paths: Vec::new(),
        }
    }

    /// Extra directories searched for `@import` / `@use`.
    pub fn with_load_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.load_paths = paths;
        self
    }

    fn compile(&self, file: &SourceFile) -> Result<String, PipelineError> {
        let path = file.path();
        let adapter = SassFs {
            fs: self.fs.as_ref(),
            entry: &path,
            entry_contents: &file.contents,
        };

        let mut load_paths = self.load_paths.clone();
        if let Some(dir) = path.parent() {
            load_paths.insert(0, dir.to_path_buf());
        }

        let options = Options::default()
            .fs(&adapter)
            .load_paths(load_paths.as_slice())
            .style(OutputStyle::Expanded);

        grass::from_path(&path, &options)
            .map_err(|err| PipelineError::stage(self.name(), &path, err))
    }
}

impl Stage for CompileSass {
    fn name(&self) -> &'static str {
        "sass"
    }

    fn apply(&self, files: Vec<SourceFile>) -> Result<Vec<SourceFile>, PipelineError> {
        map_each(files, |mut file| {
            if file.file_name().starts_with('_') {
                debug!(file = ?file.relative, "skipping sass partial");
                return Ok(None);
            }
            let css = self.compile(&file)?;
            file.relative = file.relative.with_extension("css");
            file.contents = css.into_bytes();
            Ok(Some(file))
        })
    }
}

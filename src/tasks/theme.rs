// src/tasks/theme.rs

//! The theme's build tasks, wired against a [`ThemeLayout`].

use std::sync::Arc;

use crate::config::{Settings, ThemeLayout};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::pipeline::stages::{
    CompileSass, CompressImages, MinifyCss, MinifyJs, Rename, SassGlobImports, SortDeclarations,
};
use crate::pipeline::{GlobSource, Pipeline};
use crate::tasks::registry::{TaskAction, TaskRegistry};
use crate::watch::{WatchBinding, WatchTarget};

pub const SASS_TASK: &str = "sass";
pub const JS_TASK: &str = "js";
pub const IMAGEMIN_TASK: &str = "imagemin";
pub const RELOAD_TASK: &str = "bs-reload";

/// Build the registry for the configured theme.
pub fn theme_registry(settings: &Settings, fs: Arc<dyn FileSystem>) -> Result<TaskRegistry> {
    let layout = &settings.layout;
    let mut registry = TaskRegistry::new();

    registry.register(SASS_TASK, TaskAction::Pipeline(sass_pipeline(layout, fs)?))?;
    registry.register(JS_TASK, TaskAction::Pipeline(js_pipeline(layout)?))?;
    registry.register(
        IMAGEMIN_TASK,
        TaskAction::Pipeline(imagemin_pipeline(layout, settings)?),
    )?;
    registry.register(RELOAD_TASK, TaskAction::Reload)?;

    Ok(registry)
}

/// Compile, sort, write expanded CSS to `css/` and the theme root, then write
/// the minified copy as `css/*.min.css`.
pub fn sass_pipeline(layout: &ThemeLayout, fs: Arc<dyn FileSystem>) -> Result<Pipeline> {
    let source = GlobSource::new(layout.root(), "sass/*.scss")?;
    Ok(Pipeline::new(SASS_TASK, source)
        .pipe(SassGlobImports::new(Arc::clone(&fs)))
        .pipe(CompileSass::new(fs))
        .pipe(SortDeclarations)
        .dest(layout.css_dir())
        .dest(layout.root())
        .notify("compiled sass")
        .pipe(MinifyCss)
        .pipe(Rename::extname(".min.css"))
        .dest(layout.css_dir())
        .notify("minified css"))
}

pub fn js_pipeline(layout: &ThemeLayout) -> Result<Pipeline> {
    let source = GlobSource::new(layout.root(), "js/*.js")?;
    Ok(Pipeline::new(JS_TASK, source)
        .pipe(MinifyJs)
        .pipe(Rename::extname(".min.js"))
        .dest(layout.js_dist_dir())
        .notify("minified js"))
}

pub fn imagemin_pipeline(layout: &ThemeLayout, settings: &Settings) -> Result<Pipeline> {
    let source = GlobSource::new(layout.root(), "images/base/*.{png,jpg,jpeg,gif,svg}")?;
    Ok(Pipeline::new(IMAGEMIN_TASK, source)
        .pipe(CompressImages::new(&settings.images))
        .dest(layout.images_dir()))
}

/// Default watch table, relative to the theme root.
pub fn theme_watch_bindings() -> Vec<WatchBinding> {
    vec![
        WatchBinding::new("sass/**/*.scss", WatchTarget::task(SASS_TASK)),
        WatchBinding::new("css/*.css", WatchTarget::Reload),
        WatchBinding::new("js/*.js", WatchTarget::task(JS_TASK)),
        WatchBinding::new("js/dist/*.js", WatchTarget::Reload),
        WatchBinding::new("**/*.php", WatchTarget::Reload),
        WatchBinding::new("**/*.html", WatchTarget::Reload),
    ]
}

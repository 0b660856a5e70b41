// tests/tasks_exec.rs

mod common;
use crate::common::{init_tracing, Notification, RecordingNotifier, ThemeFixture};

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Rgb, RgbImage};
use themewatch::engine::{ScheduledRun, TaskOutcome};
use themewatch::errors::ThemewatchError;
use themewatch::exec::execute;
use themewatch::fs::{FileSystem, RealFileSystem};
use themewatch::notifier::failure_message;
use themewatch::tasks::theme::{imagemin_pipeline, theme_registry};
use themewatch::tasks::{TaskAction, TaskKind, TaskRegistry};

fn fs() -> Arc<dyn FileSystem> {
    Arc::new(RealFileSystem)
}

fn run(task: &str) -> ScheduledRun {
    ScheduledRun {
        task: task.to_string(),
        run_id: 1,
    }
}

fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

#[test]
fn theme_registry_has_the_four_tasks() {
    let fixture = ThemeFixture::new();
    let registry = theme_registry(fixture.settings(), fs()).unwrap();

    let names: Vec<&str> = registry.names().collect();
    assert_eq!(names, vec!["bs-reload", "imagemin", "js", "sass"]);

    let kinds = registry.kinds();
    assert_eq!(kinds["sass"], TaskKind::Pipeline);
    assert_eq!(kinds["bs-reload"], TaskKind::Reload);
}

#[test]
fn registry_rejects_duplicates_and_reports_unknown_names() {
    let mut registry = TaskRegistry::new();
    registry.register("bs-reload", TaskAction::Reload).unwrap();

    let err = registry.register("bs-reload", TaskAction::Reload).unwrap_err();
    assert!(matches!(err, ThemewatchError::DuplicateTask(name) if name == "bs-reload"));

    let err = registry.require("nope").unwrap_err();
    assert!(matches!(err, ThemewatchError::TaskNotFound(name) if name == "nope"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn execute_reports_pipeline_failure_through_notifier() {
    init_tracing();
    let fixture = ThemeFixture::new();
    fixture.write("sass/style.scss", "a { color: $undefined; }");
    let registry = theme_registry(fixture.settings(), fs()).unwrap();
    let notifier = RecordingNotifier::new();

    let outcome = execute(&registry, &RealFileSystem, &notifier, &run("sass"));

    let TaskOutcome::Failed(message) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(message.contains("sass"), "message was {message}");
    assert_eq!(
        notifier.notifications(),
        vec![Notification::Failure {
            task: "sass".to_string(),
            error: message,
        }]
    );
    assert!(!fixture.exists("css/style.css"));
}

#[test]
fn execute_success_and_unknown_tasks() {
    let fixture = ThemeFixture::new();
    fixture.write("js/app.js", "function add(a, b) {\n  return a + b;\n}\n");
    let registry = theme_registry(fixture.settings(), fs()).unwrap();
    let notifier = RecordingNotifier::new();

    assert_eq!(
        execute(&registry, &RealFileSystem, &notifier, &run("js")),
        TaskOutcome::Success
    );
    assert!(fixture.exists("js/dist/app.min.js"));
    assert_eq!(notifier.successes(), vec!["minified js".to_string()]);

    let outcome = execute(&registry, &RealFileSystem, &notifier, &run("missing"));
    assert!(matches!(outcome, TaskOutcome::Failed(_)));
    assert_eq!(notifier.failures().len(), 1);
}

#[test]
fn failure_messages_are_prefixed() {
    assert_eq!(failure_message("boom"), "Error: boom");
}

#[test]
fn imagemin_compresses_without_growing_and_passes_gifs_through() {
    init_tracing();
    let fixture = ThemeFixture::new();

    let mut img = RgbImage::new(64, 64);
    for (x, y, px) in img.enumerate_pixels_mut() {
        *px = Rgb([(x * 4) as u8, (y * 4) as u8, 128]);
    }
    let png = encode(&img, ImageFormat::Png);
    let jpeg = encode(&img, ImageFormat::Jpeg);
    let gif = b"GIF89a not really a gif".to_vec();

    fixture.write("images/base/logo.png", &png);
    fixture.write("images/base/photo.jpg", &jpeg);
    fixture.write("images/base/anim.gif", &gif);

    let pipeline = imagemin_pipeline(&fixture.settings().layout, fixture.settings()).unwrap();
    let report = pipeline.run(&RealFileSystem, &RecordingNotifier::new()).unwrap();
    assert_eq!(report.inputs, 3);

    let out_png = std::fs::read(fixture.path("images/logo.png")).unwrap();
    assert!(out_png.len() <= png.len());
    let decoded = image::load_from_memory_with_format(&out_png, ImageFormat::Png).unwrap();
    assert_eq!(decoded.to_rgb8(), img, "png recompression is lossless");

    let out_jpeg = std::fs::read(fixture.path("images/photo.jpg")).unwrap();
    assert!(out_jpeg.len() <= jpeg.len());
    image::load_from_memory_with_format(&out_jpeg, ImageFormat::Jpeg).unwrap();

    assert_eq!(std::fs::read(fixture.path("images/anim.gif")).unwrap(), gif);
}

#[test]
fn imagemin_rejects_corrupt_images() {
    let fixture = ThemeFixture::new();
    fixture.write("images/base/broken.png", b"definitely not png");

    let pipeline = imagemin_pipeline(&fixture.settings().layout, fixture.settings()).unwrap();
    let err = pipeline
        .run(&RealFileSystem, &RecordingNotifier::new())
        .unwrap_err();
    assert!(err.to_string().contains("imagemin"), "error was {err}");
    assert!(!fixture.exists("images/broken.png"));
}

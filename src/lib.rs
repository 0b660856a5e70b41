// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod notifier;
pub mod pipeline;
pub mod proxy;
pub mod tasks;
pub mod types;
pub mod watch;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{load_settings, Settings};
use crate::engine::{
    CoreRuntime, NoopReload, ReloadSink, RunSummary, Runtime, RuntimeEvent, RuntimeOptions,
    TaskName,
};
use crate::errors::{Result, ThemewatchError};
use crate::exec::RealExecutorBackend;
use crate::fs::{FileSystem, RealFileSystem};
use crate::notifier::notifier_from_settings;
use crate::proxy::{start_proxy, ProxyConfig, ProxyHandle};
use crate::tasks::{theme_registry, theme_watch_bindings, TaskRegistry};
use crate::watch::{spawn_watcher, WatchTable, WatcherOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings (env file + TOML)
/// - task registry and watch table
/// - runtime / executor
/// - (optional) dev proxy and file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = load_settings(&args.root, &args.env_file, &args.config)?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let registry = Arc::new(theme_registry(&settings, Arc::clone(&fs))?);
    let table = WatchTable::compile(theme_watch_bindings(), &registry)?;

    info!(
        theme = %settings.theme_name,
        theme_root = ?settings.layout.root(),
        upstream = %settings.upstream.origin(),
        "settings resolved"
    );

    if args.dry_run {
        print_dry_run(&settings, &registry, &table);
        return Ok(());
    }

    match args.command() {
        Command::Tasks => {
            print_tasks(&registry, &table);
            Ok(())
        }
        Command::Run { tasks } => run_once(&settings, registry, fs, tasks).await,
        Command::Watch => watch(&settings, registry, fs, table, NoopReload).await,
        Command::Serve => {
            let proxy = serve(&settings).await?;
            wait_for_ctrl_c().await;
            proxy.abort();
            Ok(())
        }
        Command::Default => {
            let proxy = serve(&settings).await?;
            let result = watch(&settings, registry, fs, table, proxy.hub.clone()).await;
            proxy.abort();
            result
        }
    }
}

/// Run `tasks` once; fails if any of them failed.
pub async fn run_once(
    settings: &Settings,
    registry: Arc<TaskRegistry>,
    fs: Arc<dyn FileSystem>,
    tasks: Vec<TaskName>,
) -> Result<()> {
    for task in &tasks {
        registry.require(task)?;
    }

    let options = RuntimeOptions {
        exit_when_idle: true,
        busy_policy: settings.watch.busy_policy,
    };
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let summary = run_runtime(settings, registry, fs, options, rt_tx, rt_rx, tasks, NoopReload).await?;

    if summary.has_failures() {
        let names: Vec<&str> = summary.failed.iter().map(|(t, _)| t.as_str()).collect();
        return Err(ThemewatchError::Other(anyhow::anyhow!(
            "task(s) failed: {}",
            names.join(", ")
        )));
    }
    Ok(())
}

async fn watch<R: ReloadSink + 'static>(
    settings: &Settings,
    registry: Arc<TaskRegistry>,
    fs: Arc<dyn FileSystem>,
    table: WatchTable,
    reload: R,
) -> Result<()> {
    let options = RuntimeOptions {
        exit_when_idle: false,
        busy_policy: settings.watch.busy_policy,
    };
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let watcher = spawn_watcher(
        settings.layout.root(),
        table,
        WatcherOptions::from_settings(&settings.watch),
        Arc::clone(&fs),
        rt_tx.clone(),
    )?;

    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            wait_for_ctrl_c().await;
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let summary = run_runtime(settings, registry, fs, options, rt_tx, rt_rx, Vec::new(), reload).await?;
    watcher.abort();
    debug!(?summary, "watch session ended");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_runtime<R: ReloadSink + 'static>(
    settings: &Settings,
    registry: Arc<TaskRegistry>,
    fs: Arc<dyn FileSystem>,
    options: RuntimeOptions,
    rt_tx: mpsc::Sender<RuntimeEvent>,
    rt_rx: mpsc::Receiver<RuntimeEvent>,
    initial: Vec<TaskName>,
    reload: R,
) -> Result<RunSummary> {
    let notifier = notifier_from_settings(settings);
    let core = CoreRuntime::new(registry.kinds(), options);
    let executor = RealExecutorBackend::new(registry, fs, notifier, rt_tx);
    Runtime::new(core, rt_rx, executor, reload).run(initial).await
}

async fn serve(settings: &Settings) -> Result<ProxyHandle> {
    let proxy = start_proxy(ProxyConfig::from_settings(settings)?).await?;
    println!("[themewatch] proxying {} at {}", settings.upstream.origin(), proxy.url());

    if settings.proxy.open_browser {
        if let Err(err) = open::that(proxy.url()) {
            warn!(error = %err, "could not open browser");
        }
    }
    Ok(proxy)
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

fn print_tasks(registry: &TaskRegistry, table: &WatchTable) {
    println!("tasks ({}):", registry.len());
    for name in registry.names() {
        println!("  - {name}");
    }
    println!();
    println!("watch bindings:");
    for binding in table.bindings() {
        println!("  {:<18} -> {}", binding.pattern, binding.target);
    }
}

fn print_dry_run(settings: &Settings, registry: &TaskRegistry, table: &WatchTable) {
    println!("themewatch dry-run");
    println!("  project root   = {:?}", settings.project_root);
    println!("  theme          = {}", settings.theme_name);
    println!("  theme root     = {:?}", settings.layout.root());
    println!("  upstream       = {}", settings.upstream.origin());
    println!(
        "  proxy          = {}:{} (open_browser = {})",
        settings.proxy.bind, settings.proxy.listen_port, settings.proxy.open_browser
    );
    println!(
        "  watch          = debounce {} ms, busy_policy {:?}, skip_unchanged {}",
        settings.watch.debounce_ms, settings.watch.busy_policy, settings.watch.skip_unchanged
    );
    println!("  notify.desktop = {}", settings.notify.desktop);
    println!(
        "  images         = jpeg_quality {}, png_preset {}",
        settings.images.jpeg_quality, settings.images.png_preset
    );
    println!();

    for name in registry.names() {
        if let Some(crate::tasks::TaskAction::Pipeline(pipeline)) = registry.get(name) {
            println!("  {name}: {} ({} steps)", pipeline.source().pattern(), pipeline.steps().len());
        }
    }
    println!();
    print_tasks(registry, table);

    debug!("dry-run complete (no execution)");
}

// tests/runtime_busy_policy.rs

mod common;
use crate::common::{init_tracing, with_timeout, FakeExecutor, RecordingReload};

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use themewatch::engine::{
    BusyPolicy, CoreCommand, CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, ScheduledRun,
    TaskOutcome, TriggerReason,
};
use themewatch::tasks::TaskKind;

fn kinds() -> BTreeMap<String, TaskKind> {
    BTreeMap::from([
        ("sass".to_string(), TaskKind::Pipeline),
        ("js".to_string(), TaskKind::Pipeline),
        ("bs-reload".to_string(), TaskKind::Reload),
    ])
}

fn core(policy: BusyPolicy, exit_when_idle: bool) -> CoreRuntime {
    CoreRuntime::new(
        kinds(),
        RuntimeOptions {
            exit_when_idle,
            busy_policy: policy,
        },
    )
}

fn trigger(task: &str) -> RuntimeEvent {
    RuntimeEvent::TaskTriggered {
        task: task.to_string(),
        reason: TriggerReason::FileWatch,
    }
}

fn completed(task: &str, run_id: u64, outcome: TaskOutcome) -> RuntimeEvent {
    RuntimeEvent::TaskCompleted {
        task: task.to_string(),
        run_id,
        outcome,
    }
}

fn dispatched(commands: &[CoreCommand]) -> Vec<ScheduledRun> {
    commands
        .iter()
        .filter_map(|c| match c {
            CoreCommand::DispatchTasks(runs) => Some(runs.clone()),
            _ => None,
        })
        .flatten()
        .collect()
}

#[test]
fn queue_policy_coalesces_triggers_into_one_rerun() {
    init_tracing();
    let mut core = core(BusyPolicy::Queue, false);

    let step = core.step(trigger("sass"));
    let runs = dispatched(&step.commands);
    assert_eq!(runs.len(), 1);
    let first = runs[0].run_id;
    assert!(core.is_running("sass"));

    // Three more saves while compiling.
    for _ in 0..3 {
        let step = core.step(trigger("sass"));
        assert!(step.commands.is_empty());
    }
    assert!(!core.queue_is_empty());

    let step = core.step(completed("sass", first, TaskOutcome::Success));
    let reruns = dispatched(&step.commands);
    assert_eq!(reruns.len(), 1, "exactly one coalesced re-run");
    assert_eq!(reruns[0].task, "sass");
    assert_ne!(reruns[0].run_id, first);
    assert!(core.queue_is_empty());

    let step = core.step(completed("sass", reruns[0].run_id, TaskOutcome::Success));
    assert!(step.commands.is_empty());
    assert!(core.is_idle());
    assert_eq!(core.summary().succeeded.len(), 2);
}

#[test]
fn drop_policy_discards_busy_triggers() {
    let mut core = core(BusyPolicy::Drop, false);

    let runs = dispatched(&core.step(trigger("sass")).commands);
    assert!(core.step(trigger("sass")).commands.is_empty());
    assert!(core.queue_is_empty());

    let step = core.step(completed("sass", runs[0].run_id, TaskOutcome::Success));
    assert!(step.commands.is_empty());
    assert!(core.is_idle());
}

#[test]
fn independent_tasks_run_concurrently() {
    let mut core = core(BusyPolicy::Queue, false);

    let a = dispatched(&core.step(trigger("sass")).commands);
    let b = dispatched(&core.step(trigger("js")).commands);
    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 1);
    assert!(core.is_running("sass") && core.is_running("js"));
}

#[test]
fn failed_task_does_not_stop_the_loop() {
    let mut core = core(BusyPolicy::Queue, false);

    let runs = dispatched(&core.step(trigger("sass")).commands);
    let step = core.step(completed("sass", runs[0].run_id, TaskOutcome::Failed("boom".into())));
    assert!(step.keep_running);
    assert_eq!(core.summary().failed, vec![("sass".to_string(), "boom".to_string())]);

    let again = dispatched(&core.step(trigger("sass")).commands);
    assert_eq!(again.len(), 1, "the task can run again after failing");
}

#[test]
fn reloads_and_unknown_tasks() {
    let mut core = core(BusyPolicy::Queue, false);

    assert_eq!(core.step(trigger("bs-reload")).commands, vec![CoreCommand::BroadcastReload]);
    assert_eq!(
        core.step(RuntimeEvent::ReloadRequested {
            reason: TriggerReason::FileWatch
        })
        .commands,
        vec![CoreCommand::BroadcastReload]
    );
    assert!(core.step(trigger("does-not-exist")).commands.is_empty());
    assert_eq!(core.summary().reloads, 2);
}

#[test]
fn stale_completions_are_ignored() {
    let mut core = core(BusyPolicy::Queue, false);
    let runs = dispatched(&core.step(trigger("js")).commands);

    let step = core.step(completed("js", runs[0].run_id + 100, TaskOutcome::Success));
    assert!(step.commands.is_empty());
    assert!(core.is_running("js"));
}

#[test]
fn seed_with_only_reloads_exits_when_idle() {
    let mut core = core(BusyPolicy::Queue, true);
    let step = core.seed(vec!["bs-reload".to_string()]);
    assert_eq!(
        step.commands,
        vec![CoreCommand::BroadcastReload, CoreCommand::RequestExit]
    );
    assert!(!step.keep_running);
}

#[test]
fn shutdown_stops_the_loop() {
    let mut core = core(BusyPolicy::Queue, false);
    let step = core.step(RuntimeEvent::ShutdownRequested);
    assert!(!step.keep_running);
}

#[tokio::test]
async fn runtime_runs_seeded_tasks_and_exits_when_idle() {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), Arc::clone(&executed))
        .with_outcome("js", TaskOutcome::Failed("syntax error".into()));
    let reload = RecordingReload::new();

    let runtime = Runtime::new(
        core(BusyPolicy::Queue, true),
        rt_rx,
        executor,
        reload.clone(),
    );

    let summary = with_timeout(runtime.run(vec![
        "sass".to_string(),
        "js".to_string(),
        "bs-reload".to_string(),
    ]))
    .await
    .unwrap();

    let names: Vec<String> = executed.lock().unwrap().iter().map(|r| r.task.clone()).collect();
    assert_eq!(names, vec!["sass".to_string(), "js".to_string()]);
    assert_eq!(summary.succeeded, vec!["sass".to_string()]);
    assert_eq!(summary.failed, vec![("js".to_string(), "syntax error".to_string())]);
    assert!(summary.has_failures());
    assert_eq!(reload.count(), 1);
}

#[tokio::test]
async fn runtime_forwards_watch_reloads_until_shutdown() {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), Arc::clone(&executed));
    let reload = RecordingReload::new();

    for _ in 0..2 {
        rt_tx
            .send(RuntimeEvent::ReloadRequested {
                reason: TriggerReason::FileWatch,
            })
            .await
            .unwrap();
    }
    rt_tx.send(trigger("sass")).await.unwrap();
    rt_tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();

    let runtime = Runtime::new(core(BusyPolicy::Queue, false), rt_rx, executor, reload.clone());
    let summary = with_timeout(runtime.run(Vec::new())).await.unwrap();

    assert_eq!(reload.count(), 2);
    assert_eq!(summary.reloads, 2);
    assert_eq!(executed.lock().unwrap().len(), 1);
}

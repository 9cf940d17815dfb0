// tests/runtime_fake_executor.rs

use std::error::Error;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use assetwatch::context::PipelineContext;
use assetwatch::dag::{TaskGraph, TaskSpec};
use assetwatch::engine::{
    CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, ScheduledRun, TaskName, TriggerReason,
    TriggerWhileRunningBehaviour,
};
use assetwatch::exec::RealExecutorBackend;
use assetwatch::fs::mock::MockFileSystem;
use assetwatch::types::ReloadKind;
use assetwatch_test_utils::fake_executor::FakeExecutor;
use assetwatch_test_utils::fake_transformer::FakeTransformer;
use assetwatch_test_utils::notifier::RecordingNotifier;
use assetwatch_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn bindings(lists: &[&[&str]]) -> Vec<Vec<TaskName>> {
    lists
        .iter()
        .map(|tasks| tasks.iter().map(|t| t.to_string()).collect())
        .collect()
}

fn exit_when_idle() -> RuntimeOptions {
    RuntimeOptions {
        exit_when_idle: true,
    }
}

fn trigger(binding: usize) -> RuntimeEvent {
    RuntimeEvent::BindingTriggered {
        binding,
        reason: TriggerReason::Manual,
    }
}

#[tokio::test]
async fn burst_of_triggers_runs_binding_twice() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::<ScheduledRun>::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());

    // All three land before the first run can complete.
    for _ in 0..3 {
        rt_tx.send(trigger(0)).await?;
    }

    let core = CoreRuntime::new(
        bindings(&[&["bundle", "minify"]]),
        TriggerWhileRunningBehaviour::Queue,
        exit_when_idle(),
    );
    with_timeout(Runtime::new(core, rt_rx, executor).run()).await?;

    let runs = executed.lock().unwrap().clone();
    assert_eq!(runs.len(), 2, "one run plus exactly one coalesced follow-up");
    assert_eq!(runs[0].run_id, 1);
    assert_eq!(runs[1].run_id, 2);
    assert_eq!(runs[0].tasks, vec!["bundle".to_string(), "minify".to_string()]);
    Ok(())
}

#[tokio::test]
async fn skip_mode_runs_binding_once() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::<ScheduledRun>::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());

    for _ in 0..3 {
        rt_tx.send(trigger(0)).await?;
    }

    let core = CoreRuntime::new(
        bindings(&[&["styles"]]),
        TriggerWhileRunningBehaviour::Skip,
        exit_when_idle(),
    );
    with_timeout(Runtime::new(core, rt_rx, executor).run()).await?;

    assert_eq!(executed.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_run_does_not_stop_other_bindings() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::<ScheduledRun>::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone()).failing(0);

    rt_tx.send(trigger(0)).await?;
    rt_tx.send(trigger(1)).await?;

    let core = CoreRuntime::new(
        bindings(&[&["styles"], &["images"]]),
        TriggerWhileRunningBehaviour::Queue,
        exit_when_idle(),
    );
    with_timeout(Runtime::new(core, rt_rx, executor).run()).await?;

    let ran: Vec<usize> = executed.lock().unwrap().iter().map(|r| r.binding).collect();
    assert_eq!(ran, vec![0, 1]);
    Ok(())
}

#[tokio::test]
async fn shared_task_serializes_bindings() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::<ScheduledRun>::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());

    rt_tx.send(trigger(0)).await?;
    rt_tx.send(trigger(1)).await?;

    let core = CoreRuntime::new(
        bindings(&[&["bundle", "minify"], &["minify"]]),
        TriggerWhileRunningBehaviour::Skip,
        exit_when_idle(),
    );
    with_timeout(Runtime::new(core, rt_rx, executor).run()).await?;

    // Binding 1 waited for binding 0 instead of being dropped.
    let runs = executed.lock().unwrap().clone();
    assert_eq!(runs.iter().map(|r| r.binding).collect::<Vec<_>>(), vec![0, 1]);
    Ok(())
}

#[tokio::test]
async fn shutdown_event_stops_runtime() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(4);
    let executor = FakeExecutor::new(rt_tx.clone(), Arc::new(Mutex::new(Vec::new())));
    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;

    let core = CoreRuntime::new(
        bindings(&[&["styles"]]),
        TriggerWhileRunningBehaviour::Queue,
        RuntimeOptions::default(),
    );
    with_timeout(Runtime::new(core, rt_rx, executor).run()).await?;
    Ok(())
}

fn pipeline(
    fs: &MockFileSystem,
    styles: &FakeTransformer,
    templates: &FakeTransformer,
    notifier: Arc<RecordingNotifier>,
) -> Arc<PipelineContext> {
    let graph = TaskGraph::new(vec![
        TaskSpec::new("styles", "src/sass/*.*", "dist/css", Arc::new(styles.clone()))
            .reload(ReloadKind::Style),
        TaskSpec::new("templates", "src/views/*.html", "dist", Arc::new(templates.clone()))
            .reload(ReloadKind::Full),
        TaskSpec::new("images", "src/img/**/*", "dist/img", Arc::new(FakeTransformer::new("img.txt"))),
    ])
    .expect("valid graph");
    Arc::new(PipelineContext::new(
        Path::new("/site"),
        Arc::new(fs.clone()),
        graph,
        notifier,
    ))
}

#[tokio::test]
async fn real_executor_notifies_after_successful_runs_only() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/sass/main.scss", "a{}");
    fs.add_file("/site/src/views/index.html", "<p>");

    let styles = FakeTransformer::new("styles.txt");
    let templates = FakeTransformer::failing("pages.txt");
    let notifier = Arc::new(RecordingNotifier::new());
    let ctx = pipeline(&fs, &styles, &templates, notifier.clone());

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executor = RealExecutorBackend::new(ctx, rt_tx.clone());

    rt_tx.send(trigger(0)).await?;
    rt_tx.send(trigger(1)).await?;
    rt_tx.send(trigger(2)).await?;

    let core = CoreRuntime::new(
        bindings(&[&["styles"], &["templates"], &["images"]]),
        TriggerWhileRunningBehaviour::Queue,
        exit_when_idle(),
    );
    with_timeout(Runtime::new(core, rt_rx, executor).run()).await?;

    assert_eq!(styles.call_count(), 1);
    assert_eq!(templates.call_count(), 1);
    assert_eq!(fs.contents("/site/dist/css/styles.txt").as_deref(), Some(&b"main.scss"[..]));
    // Failed templates and reload-less images send nothing.
    assert_eq!(notifier.sent(), vec![ReloadKind::Style]);
    Ok(())
}

#[tokio::test]
async fn run_of_several_tasks_sends_strongest_reload() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    let styles = FakeTransformer::new("styles.txt");
    let templates = FakeTransformer::new("pages.txt");
    let notifier = Arc::new(RecordingNotifier::new());
    let ctx = pipeline(&fs, &styles, &templates, notifier.clone());

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executor = RealExecutorBackend::new(ctx, rt_tx.clone());
    rt_tx.send(trigger(0)).await?;

    let core = CoreRuntime::new(
        bindings(&[&["styles", "templates", "images"]]),
        TriggerWhileRunningBehaviour::Queue,
        exit_when_idle(),
    );
    with_timeout(Runtime::new(core, rt_rx, executor).run()).await?;

    assert_eq!(notifier.sent(), vec![ReloadKind::Full]);
    Ok(())
}

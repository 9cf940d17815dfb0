// tests/task_plans.rs

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use assetwatch::cli::Command;
use assetwatch::context::PipelineContext;
use assetwatch::dag::{run_plan, Plan, TaskGraph, TaskSpec};
use assetwatch::engine::TaskOutcome;
use assetwatch::errors::AssetwatchError;
use assetwatch::fs::mock::MockFileSystem;
use assetwatch::fs::{FileSystem, RealFileSystem};
use assetwatch::reload::NoopNotifier;
use assetwatch::{command_plan, run_once};
use assetwatch_test_utils::builders::ConfigFileBuilder;
use assetwatch_test_utils::fake_transformer::FakeTransformer;
use assetwatch_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn task(name: &str, transformer: &FakeTransformer) -> TaskSpec {
    TaskSpec::new(
        name,
        "src/*",
        format!("out/{name}"),
        Arc::new(transformer.clone()),
    )
}

fn context(root: &Path, fs: Arc<dyn FileSystem>, specs: Vec<TaskSpec>) -> Arc<PipelineContext> {
    let graph = TaskGraph::new(specs).expect("valid graph");
    Arc::new(PipelineContext::new(root, fs, graph, Arc::new(NoopNotifier)))
}

#[test]
fn builtin_graph_plans() -> TestResult {
    let graph = TaskGraph::from_config(&ConfigFileBuilder::new().build())?;

    assert_eq!(graph.chain("bundle")?.to_string(), "series(bundle -> minify)");
    assert_eq!(
        graph.default_plan()?.to_string(),
        "parallel(styles, images, bundle, templates)"
    );
    assert_eq!(command_plan(&graph, &Command::Scripts)?.to_string(), "series(bundle -> minify)");
    assert_eq!(command_plan(&graph, &Command::Minify)?.to_string(), "minify");
    assert_eq!(command_plan(&graph, &Command::Styles)?, Plan::task("styles"));
    Ok(())
}

#[test]
fn chain_of_unknown_task_is_an_error() -> TestResult {
    let graph = TaskGraph::from_config(&ConfigFileBuilder::new().build())?;
    let err = graph.chain("fonts").unwrap_err();
    assert!(matches!(err, AssetwatchError::TaskNotFound(name) if name == "fonts"));
    Ok(())
}

#[test]
fn duplicate_task_names_are_rejected() {
    let t = FakeTransformer::new("x");
    let err = TaskGraph::new(vec![task("a", &t), task("a", &t)]).unwrap_err();
    assert!(matches!(err, AssetwatchError::ConfigError(_)));
}

#[tokio::test]
async fn series_stops_at_first_failure() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/main.js", "x");

    let first = FakeTransformer::failing("first.txt");
    let second = FakeTransformer::new("second.txt");
    let ctx = context(
        Path::new("/p"),
        Arc::new(fs.clone()),
        vec![task("first", &first).then("second"), task("second", &second)],
    );

    let plan = ctx.graph.chain("first")?;
    let outcome = with_timeout(run_plan(Arc::clone(&ctx), plan)).await;

    assert_eq!(outcome, TaskOutcome::Failed);
    assert_eq!(first.call_count(), 1);
    assert_eq!(second.call_count(), 0, "dependent step must never be invoked");
    assert!(fs.contents("/p/out/second/second.txt").is_none());
    Ok(())
}

#[tokio::test]
async fn series_runs_steps_in_order() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/a.js", "a");

    let first = FakeTransformer::new("done.txt");
    let second = FakeTransformer::new("done.txt");
    let ctx = context(
        Path::new("/p"),
        Arc::new(fs.clone()),
        vec![task("first", &first), task("second", &second)],
    );

    let plan = ctx.graph.series(&["first".to_string(), "second".to_string()])?;
    assert_eq!(with_timeout(run_plan(ctx, plan)).await, TaskOutcome::Success);

    // The mock clock ticks on every write: the second output is newer.
    let a = fs.modified(Path::new("/p/out/first/done.txt"))?;
    let b = fs.modified(Path::new("/p/out/second/done.txt"))?;
    assert!(a < b);
    Ok(())
}

#[tokio::test]
async fn parallel_runs_every_member_and_reports_failure() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    std::fs::create_dir_all(dir.path().join("src"))?;
    std::fs::write(dir.path().join("src/input.txt"), "hello")?;

    let members = [
        FakeTransformer::new("done.txt"),
        FakeTransformer::failing("done.txt"),
        FakeTransformer::new("done.txt"),
        FakeTransformer::new("done.txt"),
    ];
    let names = ["p1", "p2", "p3", "p4"];
    let specs = names
        .iter()
        .zip(&members)
        .map(|(name, t)| task(name, t))
        .collect();
    let ctx = context(dir.path(), Arc::new(RealFileSystem), specs);

    let plan = Plan::parallel(names.iter().map(|n| Plan::task(*n)).collect());
    let outcome = with_timeout(run_plan(ctx, plan)).await;

    assert_eq!(outcome, TaskOutcome::Failed);
    for t in &members {
        assert_eq!(t.call_count(), 1);
    }
    for name in ["p1", "p3", "p4"] {
        let out = dir.path().join("out").join(name).join("done.txt");
        assert_eq!(std::fs::read_to_string(&out)?, "input.txt");
    }
    assert!(!dir.path().join("out/p2/done.txt").exists());
    Ok(())
}

#[tokio::test]
async fn run_once_maps_failure_to_error() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    let broken = FakeTransformer::failing("x");
    let ctx = context(Path::new("/p"), Arc::new(fs), vec![task("broken", &broken)]);

    let err = with_timeout(run_once(ctx, Plan::task("broken"))).await.unwrap_err();
    assert!(matches!(err, AssetwatchError::TasksFailed(label) if label == "broken"));
    Ok(())
}

#[tokio::test]
async fn incremental_task_only_sees_stale_sources() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/a.png", "a");
    fs.add_file("/p/src/b.png", "b");
    fs.add_file("/p/out/images/b.png", "b-out");

    let t = FakeTransformer::new("seen.txt");
    let ctx = context(
        Path::new("/p"),
        Arc::new(fs.clone()),
        vec![task("images", &t).incremental(true)],
    );

    assert_eq!(with_timeout(ctx.run_task("images")).await, TaskOutcome::Success);
    assert_eq!(fs.contents("/p/out/images/seen.txt").as_deref(), Some(&b"a.png"[..]));
    Ok(())
}

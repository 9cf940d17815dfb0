// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod freshness;
pub mod fs;
pub mod logging;
pub mod reload;
pub mod source;
pub mod transform;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{load_or_default, project_root, ConfigFile};
use crate::context::PipelineContext;
use crate::dag::task::{BUNDLE, IMAGES, MINIFY, STYLES, TEMPLATES};
use crate::dag::{run_plan, Plan, TaskGraph};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TaskName};
use crate::errors::{AssetwatchError, Result};
use crate::exec::RealExecutorBackend;
use crate::fs::{FileSystem, RealFileSystem};
use crate::reload::{NoopNotifier, PreviewServer, ReloadNotifier};

/// High-level entry point used by `main.rs`.
///
/// Loads the config, builds the task graph, then either runs one plan to
/// completion or enters watch/serve mode.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.as_ref().map(PathBuf::from);
    let cfg = load_or_default(config_path.as_deref())?;
    let root = project_root(config_path.as_deref());
    let graph = TaskGraph::from_config(&cfg)?;

    let command = args.command.clone().unwrap_or(Command::Build);

    if args.dry_run {
        print_dry_run(&cfg, &graph, &root, &command)?;
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    match command {
        Command::Watch { no_serve } => watch(cfg, graph, root, fs, !no_serve).await,
        Command::Serve => serve(&cfg, root, fs).await,
        one_shot => {
            let plan = command_plan(&graph, &one_shot)?;
            let ctx = Arc::new(PipelineContext::new(root, fs, graph, Arc::new(NoopNotifier)));
            run_once(ctx, plan).await
        }
    }
}

/// The plan a one-shot command runs.
pub fn command_plan(graph: &TaskGraph, command: &Command) -> Result<Plan> {
    match command {
        Command::Build => graph.default_plan(),
        Command::Styles => graph.series(&[STYLES.to_string()]),
        Command::Bundle => graph.series(&[BUNDLE.to_string()]),
        Command::Scripts => graph.chain(BUNDLE),
        Command::Minify => graph.series(&[MINIFY.to_string()]),
        Command::Images => graph.series(&[IMAGES.to_string()]),
        Command::Templates => graph.series(&[TEMPLATES.to_string()]),
        Command::Watch { .. } | Command::Serve => graph.default_plan(),
    }
}

/// Run `plan` once; any failed task makes the whole command fail.
pub async fn run_once(ctx: Arc<PipelineContext>, plan: Plan) -> Result<()> {
    let label = plan.to_string();
    info!(plan = %label, "build started");

    if run_plan(ctx, plan).await.is_failure() {
        return Err(AssetwatchError::TasksFailed(label));
    }

    info!(plan = %label, "build finished");
    Ok(())
}

async fn watch(
    cfg: ConfigFile,
    graph: TaskGraph,
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    serve: bool,
) -> Result<()> {
    let notifier: Arc<dyn ReloadNotifier> = if serve {
        PreviewServer::start(Arc::clone(&fs), root.join(&cfg.serve.root), &cfg.serve)?
    } else {
        Arc::new(NoopNotifier)
    };

    let ctx = Arc::new(PipelineContext::new(
        root.clone(),
        Arc::clone(&fs),
        graph,
        notifier,
    ));

    let profiles = watch::build_binding_profiles(cfg.bindings())?;
    let bindings: Vec<Vec<TaskName>> = cfg.bindings().iter().map(|b| b.run.clone()).collect();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let _watcher = watch::spawn_watcher(root, profiles, rt_tx.clone(), fs)?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let core = CoreRuntime::new(bindings, cfg.while_running, RuntimeOptions::default());
    let executor = RealExecutorBackend::new(ctx, rt_tx);
    Runtime::new(core, rt_rx, executor).run().await
}

async fn serve(cfg: &ConfigFile, root: PathBuf, fs: Arc<dyn FileSystem>) -> Result<()> {
    let _server = PreviewServer::start(fs, root.join(&cfg.serve.root), &cfg.serve)?;
    tokio::signal::ctrl_c().await?;
    info!("shutting down preview server");
    Ok(())
}

/// Print the resolved configuration: tasks, the chosen plan and bindings.
fn print_dry_run(cfg: &ConfigFile, graph: &TaskGraph, root: &Path, command: &Command) -> Result<()> {
    println!("assetwatch dry-run");
    println!("  root = {}", root.display());
    println!("  watch.while_running = {:?}", cfg.while_running);
    println!();

    println!("tasks:");
    for name in graph.names() {
        let Some(spec) = graph.get(name) else {
            continue;
        };
        println!("  - {name}");
        println!("      src: {}", spec.src);
        println!("      dest: {}", spec.dest.display());
        println!("      transformer: {}", spec.transformer.label());
        if spec.incremental {
            println!("      incremental: true");
        }
        println!("      reload: {}", spec.reload);
        if !spec.then.is_empty() {
            println!("      then: {:?}", spec.then);
        }
    }
    println!();

    match command {
        Command::Watch { .. } => {
            println!("bindings ({}):", cfg.bindings().len());
            for (id, binding) in cfg.bindings().iter().enumerate() {
                println!("  [{id}] watch: {:?}", binding.watch);
                if !binding.exclude.is_empty() {
                    println!("      exclude: {:?}", binding.exclude);
                }
                println!("      run: {}", binding.run.join(" -> "));
                if binding.use_hash {
                    println!("      use_hash: true");
                }
            }
        }
        Command::Serve => {
            println!(
                "serve: {} on http://{}:{} (ws {})",
                cfg.serve.root, cfg.serve.open_host, cfg.serve.port, cfg.serve.ws_port
            );
        }
        other => println!("plan: {}", command_plan(graph, other)?),
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

// src/context.rs

//! Shared state for running tasks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::dag::{TaskGraph, TaskSpec};
use crate::engine::TaskOutcome;
use crate::freshness;
use crate::fs::FileSystem;
use crate::reload::ReloadNotifier;
use crate::source::SourceSet;
use crate::transform::{TaskReport, TransformContext, TransformError};

/// Everything a task run needs, created once at startup and shared by
/// reference between concurrent tasks.
#[derive(Debug)]
pub struct PipelineContext {
    pub root: PathBuf,
    pub fs: Arc<dyn FileSystem>,
    pub graph: TaskGraph,
    pub notifier: Arc<dyn ReloadNotifier>,
}

impl PipelineContext {
    pub fn new(
        root: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        graph: TaskGraph,
        notifier: Arc<dyn ReloadNotifier>,
    ) -> Self {
        Self {
            root: root.into(),
            fs,
            graph,
            notifier,
        }
    }

    /// Run one task to completion.
    ///
    /// The transformer runs on the blocking pool; failures are logged here and
    /// reported only as [`TaskOutcome::Failed`].
    pub async fn run_task(&self, name: &str) -> TaskOutcome {
        let Some(spec) = self.graph.get(name).cloned() else {
            error!(task = %name, "unknown task");
            return TaskOutcome::Failed;
        };

        info!(task = %name, transformer = spec.transformer.label(), "starting task");
        let started = Instant::now();

        let fs = Arc::clone(&self.fs);
        let root = self.root.clone();
        let joined = tokio::task::spawn_blocking(move || execute_task(fs, root, &spec)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match joined {
            Ok(Ok(report)) => {
                if report.errors > 0 {
                    warn!(
                        task = %name,
                        written = report.written,
                        errors = report.errors,
                        elapsed_ms,
                        "task finished with per-file errors"
                    );
                } else {
                    info!(
                        task = %name,
                        written = report.written,
                        passed_through = report.passed_through,
                        skipped = report.skipped,
                        elapsed_ms,
                        "task finished"
                    );
                }
                TaskOutcome::Success
            }
            Ok(Err(err)) => {
                error!(task = %name, error = %err, elapsed_ms, "task failed");
                TaskOutcome::Failed
            }
            Err(join_err) => {
                error!(task = %name, error = %join_err, "task aborted");
                TaskOutcome::Failed
            }
        }
    }
}

/// Expand, filter, and transform. Synchronous; no tokio types involved.
pub fn execute_task(
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    spec: &TaskSpec,
) -> Result<TaskReport, TransformError> {
    let sources = SourceSet::expand(fs.as_ref(), &root, &spec.src)
        .map_err(|e| TransformError::io(root.join(&spec.src), e))?;
    let dest = root.join(&spec.dest);

    let (work, already_fresh) = if spec.incremental {
        let stale = freshness::stale(fs.as_ref(), &sources, &dest);
        let fresh = sources.len() - stale.len();
        (stale, fresh)
    } else {
        (sources, 0)
    };

    debug!(task = %spec.name, inputs = work.len(), already_fresh, "transforming");

    let ctx = TransformContext {
        task: spec.name.clone(),
        fs,
        root,
        dest,
    };
    let mut report = spec.transformer.transform(&ctx, &work)?;
    report.skipped += already_fresh;
    Ok(report)
}

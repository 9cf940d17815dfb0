// src/exec/runner.rs

//! Execution of one binding run.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::context::PipelineContext;
use crate::dag::run_plan;
use crate::engine::{RuntimeEvent, ScheduledRun, TaskOutcome};
use crate::types::ReloadKind;

/// Run a binding's tasks in series, notify on success, and report back.
///
/// Returns the outcome so callers outside the runtime (tests, one-shot
/// builds) can use it too.
pub async fn execute_run(ctx: &Arc<PipelineContext>, run: &ScheduledRun) -> TaskOutcome {
    let plan = match ctx.graph.series(&run.tasks) {
        Ok(plan) => plan,
        Err(err) => {
            error!(binding = run.binding, error = %err, "binding refers to unknown task");
            return TaskOutcome::Failed;
        }
    };

    info!(binding = run.binding, run_id = run.run_id, %plan, "run started");
    let outcome = run_plan(Arc::clone(ctx), plan).await;

    match outcome {
        TaskOutcome::Success => {
            let kind = ctx.graph.reload_kind(&run.tasks);
            if kind != ReloadKind::None {
                ctx.notifier.notify(kind);
            } else {
                debug!(binding = run.binding, "nothing to reload");
            }
        }
        TaskOutcome::Failed => {
            warn!(binding = run.binding, run_id = run.run_id, "run failed; no reload sent");
        }
    }
    outcome
}

pub async fn run_binding(
    ctx: Arc<PipelineContext>,
    run: ScheduledRun,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let outcome = execute_run(&ctx, &run).await;

    let event = RuntimeEvent::RunCompleted {
        binding: run.binding,
        run_id: run.run_id,
        outcome,
    };
    if runtime_tx.send(event).await.is_err() {
        debug!(binding = run.binding, "runtime gone; completion dropped");
    }
}

// src/exec/executor_loop.rs

//! Background loop that turns scheduled runs into Tokio tasks.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::context::PipelineContext;
use crate::engine::{RuntimeEvent, ScheduledRun};
use crate::exec::runner::run_binding;

/// Spawn the background executor loop.
///
/// Each received run executes in its own Tokio task so a long image pass
/// never holds up a stylesheet rebuild. Exclusivity (one run per binding, no
/// shared tasks in flight) is decided by the core before a run gets here.
pub fn spawn_executor(
    ctx: Arc<PipelineContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<ScheduledRun> {
    let (tx, mut rx) = mpsc::channel::<ScheduledRun>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        while let Some(run) = rx.recv().await {
            debug!(binding = run.binding, run_id = run.run_id, "executor received run");
            tokio::spawn(run_binding(Arc::clone(&ctx), run, runtime_tx.clone()));
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}

// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender, so
//! tests can swap in a fake that records runs and answers with
//! `RunCompleted` events directly.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;

use crate::context::PipelineContext;
use crate::engine::{RuntimeEvent, ScheduledRun};
use crate::errors::Result;

use super::executor_loop::spawn_executor;

/// How scheduled binding runs are executed.
pub trait ExecutorBackend: Send {
    /// Accept a run for execution. Must not wait for it to finish: the
    /// outcome is reported later as a `RuntimeEvent::RunCompleted`.
    fn dispatch(
        &mut self,
        run: ScheduledRun,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production backend: forwards runs to the background executor loop.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ScheduledRun>,
}

impl RealExecutorBackend {
    /// Spawns the background executor loop immediately.
    pub fn new(ctx: Arc<PipelineContext>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        let tx = spawn_executor(ctx, runtime_tx);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn dispatch(
        &mut self,
        run: ScheduledRun,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();

        Box::pin(async move {
            tx.send(run)
                .await
                .map_err(|e| anyhow!("executor loop closed: {e}"))?;
            Ok(())
        })
    }
}

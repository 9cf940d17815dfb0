use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use assetwatch::engine::{BindingId, RuntimeEvent, ScheduledRun, TaskOutcome};
use assetwatch::exec::ExecutorBackend;
use assetwatch::errors::Result;

/// A fake executor that:
/// - records every dispatched run;
/// - reports `RunCompleted` for it right away, `Failed` for bindings listed
///   in `failing`, `Success` otherwise.
///
/// Completions are sent from a spawned task, so events already waiting in
/// the runtime channel are handled first.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<ScheduledRun>>>,
    failing: HashSet<BindingId>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<ScheduledRun>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, binding: BindingId) -> Self {
        self.failing.insert(binding);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn dispatch(
        &mut self,
        run: ScheduledRun,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let outcome = if self.failing.contains(&run.binding) {
            TaskOutcome::Failed
        } else {
            TaskOutcome::Success
        };

        Box::pin(async move {
            self.executed.lock().unwrap().push(run.clone());

            tokio::spawn(async move {
                let _ = tx
                    .send(RuntimeEvent::RunCompleted {
                        binding: run.binding,
                        run_id: run.run_id,
                        outcome,
                    })
                    .await;
            });
            Ok(())
        })
    }
}

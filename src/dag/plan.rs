// src/dag/plan.rs

//! Composable execution plans.
//!
//! A [`Plan`] is a tree of tasks combined with two operators:
//!
//! - `Series`: members run one after another; the first failure stops the
//!   series and later members are never started.
//! - `Parallel`: all members start together and all run to completion; the
//!   group fails if any member failed, without cancelling the others.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, warn};

use crate::context::PipelineContext;
use crate::dag::task::TaskName;
use crate::engine::TaskOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Task(TaskName),
    Series(Vec<Plan>),
    Parallel(Vec<Plan>),
}

impl Plan {
    pub fn task(name: impl Into<TaskName>) -> Self {
        Plan::Task(name.into())
    }

    /// Series of `steps`; a single step stands for itself.
    pub fn series(mut steps: Vec<Plan>) -> Self {
        if steps.len() == 1 {
            steps.remove(0)
        } else {
            Plan::Series(steps)
        }
    }

    pub fn parallel(mut members: Vec<Plan>) -> Self {
        if members.len() == 1 {
            members.remove(0)
        } else {
            Plan::Parallel(members)
        }
    }

    /// Every task the plan can run, in plan order.
    pub fn tasks(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_tasks(&mut out);
        out
    }

    fn collect_tasks<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Plan::Task(name) => out.push(name),
            Plan::Series(steps) | Plan::Parallel(steps) => {
                for step in steps {
                    step.collect_tasks(out);
                }
            }
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Plan], sep: &str) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Plan::Task(name) => f.write_str(name),
            Plan::Series(steps) => {
                f.write_str("series(")?;
                join(f, steps, " -> ")?;
                f.write_str(")")
            }
            Plan::Parallel(members) => {
                f.write_str("parallel(")?;
                join(f, members, ", ")?;
                f.write_str(")")
            }
        }
    }
}

pub type PlanFuture = Pin<Box<dyn Future<Output = TaskOutcome> + Send + 'static>>;

/// Execute `plan` against `ctx`.
///
/// Boxed because plans nest recursively.
pub fn run_plan(ctx: Arc<PipelineContext>, plan: Plan) -> PlanFuture {
    Box::pin(async move {
        match plan {
            Plan::Task(name) => ctx.run_task(&name).await,

            Plan::Series(steps) => {
                let total = steps.len();
                for (idx, step) in steps.into_iter().enumerate() {
                    let label = step.to_string();
                    if run_plan(Arc::clone(&ctx), step).await.is_failure() {
                        let skipped = total - idx - 1;
                        if skipped > 0 {
                            warn!(failed = %label, skipped, "series stopped; later steps not run");
                        }
                        return TaskOutcome::Failed;
                    }
                }
                TaskOutcome::Success
            }

            Plan::Parallel(members) => {
                let mut set = JoinSet::new();
                for member in members {
                    set.spawn(run_plan(Arc::clone(&ctx), member));
                }

                let mut failed = 0usize;
                while let Some(joined) = set.join_next().await {
                    match joined {
                        Ok(TaskOutcome::Success) => {}
                        Ok(TaskOutcome::Failed) => failed += 1,
                        Err(err) => {
                            error!(error = %err, "parallel member aborted");
                            failed += 1;
                        }
                    }
                }

                if failed == 0 {
                    TaskOutcome::Success
                } else {
                    warn!(failed, "parallel group finished with failures");
                    TaskOutcome::Failed
                }
            }
        }
    })
}

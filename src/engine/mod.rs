// src/engine/mod.rs

//! Watch-mode dispatch engine.
//!
//! Each watch binding (a set of globs plus the tasks to run) is dispatched
//! independently. The engine guarantees:
//! - at most one run per binding in flight;
//! - triggers during a run coalesce into at most one follow-up run (or are
//!   dropped, with `while_running = "skip"`);
//! - two bindings sharing a task never run at the same time.
//!
//! The pure state machine lives in [`core`]; the async/IO shell is
//! [`runtime`].

pub use crate::dag::TaskName;

/// Index of a binding in the configured binding list.
pub type BindingId = usize;

/// Outcome of a task, series or binding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

impl TaskOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, TaskOutcome::Success)
    }

    pub fn is_failure(self) -> bool {
        !self.is_success()
    }
}

/// Why a binding was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Manual trigger (tests, startup).
    Manual,
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Exit once every binding is idle and nothing is pending. Watch mode
    /// never sets this; tests do.
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the watcher and the executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Files matching a binding changed.
    BindingTriggered {
        binding: BindingId,
        reason: TriggerReason,
    },
    /// A dispatched run finished.
    RunCompleted {
        binding: BindingId,
        run_id: u64,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// One binding run handed to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRun {
    pub binding: BindingId,
    /// Monotonic across the whole session.
    pub run_id: u64,
    /// Run in order; the first failure stops the rest.
    pub tasks: Vec<TaskName>,
}

pub mod bindings;
pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use bindings::{BindingState, BindingTable};
pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use crate::types::TriggerWhileRunningBehaviour;
pub use runtime::Runtime;

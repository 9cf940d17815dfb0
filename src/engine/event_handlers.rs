// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info, warn};

use crate::engine::bindings::{BindingState, BindingTable};
use crate::engine::queue::TriggerQueue;
use crate::engine::{BindingId, RuntimeOptions, ScheduledRun, TaskOutcome, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Hand this run to the executor.
    Dispatch(ScheduledRun),
    /// Request that the process exits (only with `exit_when_idle`).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a change notification for one binding.
///
/// - In flight: coalesce (queue) or drop (skip) per the configured behaviour.
/// - Idle but sharing a task with another in-flight binding: defer.
/// - Idle otherwise: dispatch now.
pub fn handle_binding_trigger(
    table: &mut BindingTable,
    queue: &mut TriggerQueue,
    binding: BindingId,
    reason: TriggerReason,
) -> CoreStep {
    let mut commands = Vec::new();

    match table.state(binding) {
        None => {
            warn!(binding, "trigger for unknown binding ignored");
        }
        Some(BindingState::Dispatching { run_id }) => {
            debug!(binding, run_id, ?reason, "binding busy");
            queue.record_trigger(binding);
        }
        Some(BindingState::Idle) if queue.is_pending(binding) => {
            debug!(binding, "already waiting for shared tasks");
        }
        Some(BindingState::Idle) if table.conflicts(binding) => {
            queue.defer(binding);
        }
        Some(BindingState::Idle) => {
            if let Some(run) = table.start(binding) {
                info!(binding, run_id = run.run_id, tasks = ?run.tasks, ?reason, "dispatching");
                commands.push(CoreCommand::Dispatch(run));
            }
        }
    }

    CoreStep::running(commands)
}

/// Handle the end of a binding run and start whatever was waiting on it.
pub fn handle_run_completion(
    table: &mut BindingTable,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    binding: BindingId,
    run_id: u64,
    outcome: TaskOutcome,
) -> CoreStep {
    if table.finish(binding, run_id) {
        match outcome {
            TaskOutcome::Success => info!(binding, run_id, "run succeeded"),
            TaskOutcome::Failed => warn!(binding, run_id, "run failed; still watching"),
        }
    } else {
        warn!(binding, run_id, "completion for a run that is not in flight; ignored");
    }

    let mut commands = start_pending(table, queue, binding);

    let mut keep_running = true;
    if options.exit_when_idle && table.all_idle() && queue.is_empty() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}

/// Start every pending binding that can run now.
///
/// Candidates are visited round-robin starting after `completed`, so a
/// binding retriggered on every run cannot starve another that shares its
/// tasks.
fn start_pending(
    table: &mut BindingTable,
    queue: &mut TriggerQueue,
    completed: BindingId,
) -> Vec<CoreCommand> {
    let mut candidates: Vec<BindingId> = queue.pending().collect();
    candidates.sort_by_key(|id| (*id <= completed, *id));

    let mut commands = Vec::new();
    for id in candidates {
        if table.state(id) != Some(BindingState::Idle) || table.conflicts(id) {
            continue;
        }
        queue.take(id);
        if let Some(run) = table.start(id) {
            info!(binding = id, run_id = run.run_id, tasks = ?run.tasks, "dispatching queued run");
            commands.push(CoreCommand::Dispatch(run));
        }
    }
    commands
}

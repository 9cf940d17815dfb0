// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! Consumes [`RuntimeEvent`]s and produces an updated state plus the
//! commands the IO shell should execute. No channels, no Tokio, no IO: the
//! core is tested by stepping it directly.

use crate::engine::bindings::{BindingState, BindingTable};
use crate::engine::event_handlers::{handle_binding_trigger, handle_run_completion, CoreStep};
use crate::engine::queue::TriggerQueue;
use crate::engine::{BindingId, RuntimeEvent, RuntimeOptions, TaskName};
use crate::types::TriggerWhileRunningBehaviour;

#[derive(Debug)]
pub struct CoreRuntime {
    table: BindingTable,
    queue: TriggerQueue,
    options: RuntimeOptions,
}

impl CoreRuntime {
    /// `bindings[i]` lists the tasks binding `i` runs.
    pub fn new(
        bindings: Vec<Vec<TaskName>>,
        behaviour: TriggerWhileRunningBehaviour,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            table: BindingTable::new(bindings),
            queue: TriggerQueue::new(behaviour),
            options,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.table.all_idle()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn state_of(&self, binding: BindingId) -> Option<BindingState> {
        self.table.state(binding)
    }

    pub fn is_pending(&self, binding: BindingId) -> bool {
        self.queue.is_pending(binding)
    }

    pub fn binding_count(&self) -> usize {
        self.table.len()
    }

    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::BindingTriggered { binding, reason } => {
                handle_binding_trigger(&mut self.table, &mut self.queue, binding, reason)
            }
            RuntimeEvent::RunCompleted {
                binding,
                run_id,
                outcome,
            } => handle_run_completion(
                &mut self.table,
                &mut self.queue,
                &self.options,
                binding,
                run_id,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}

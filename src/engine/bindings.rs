// src/engine/bindings.rs

//! Per-binding run state.

use super::{BindingId, ScheduledRun, TaskName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Idle,
    Dispatching { run_id: u64 },
}

#[derive(Debug)]
struct BindingSlot {
    tasks: Vec<TaskName>,
    state: BindingState,
}

/// State of every binding plus the session-wide run counter.
#[derive(Debug)]
pub struct BindingTable {
    slots: Vec<BindingSlot>,
    next_run_id: u64,
}

impl BindingTable {
    /// One entry per binding: the tasks it runs, in order.
    pub fn new(bindings: Vec<Vec<TaskName>>) -> Self {
        Self {
            slots: bindings
                .into_iter()
                .map(|tasks| BindingSlot {
                    tasks,
                    state: BindingState::Idle,
                })
                .collect(),
            next_run_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn state(&self, binding: BindingId) -> Option<BindingState> {
        self.slots.get(binding).map(|s| s.state)
    }

    pub fn tasks_of(&self, binding: BindingId) -> &[TaskName] {
        self.slots
            .get(binding)
            .map(|s| s.tasks.as_slice())
            .unwrap_or(&[])
    }

    pub fn all_idle(&self) -> bool {
        self.slots.iter().all(|s| s.state == BindingState::Idle)
    }

    pub fn in_flight(&self) -> impl Iterator<Item = BindingId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s.state, BindingState::Dispatching { .. }))
            .map(|(id, _)| id)
    }

    /// Whether another in-flight binding runs any of `binding`'s tasks.
    pub fn conflicts(&self, binding: BindingId) -> bool {
        let mine = self.tasks_of(binding);
        self.in_flight()
            .filter(|other| *other != binding)
            .any(|other| self.tasks_of(other).iter().any(|t| mine.contains(t)))
    }

    /// Mark `binding` as dispatching under a fresh run id.
    ///
    /// Callers check `state == Idle` and `!conflicts` first.
    pub fn start(&mut self, binding: BindingId) -> Option<ScheduledRun> {
        let run_id = self.next_run_id;
        let slot = self.slots.get_mut(binding)?;
        slot.state = BindingState::Dispatching { run_id };
        self.next_run_id += 1;

        Some(ScheduledRun {
            binding,
            run_id,
            tasks: slot.tasks.clone(),
        })
    }

    /// Return `binding` to idle if `run_id` is its in-flight run.
    pub fn finish(&mut self, binding: BindingId, run_id: u64) -> bool {
        match self.slots.get_mut(binding) {
            Some(slot) if slot.state == (BindingState::Dispatching { run_id }) => {
                slot.state = BindingState::Idle;
                true
            }
            _ => false,
        }
    }
}

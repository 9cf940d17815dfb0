// src/engine/queue.rs

use std::collections::BTreeSet;

use tracing::debug;

use super::BindingId;
use crate::types::TriggerWhileRunningBehaviour;

/// Pending follow-up runs, one flag per binding.
///
/// A set rather than a counter: any number of triggers during a run collapse
/// into a single follow-up. Iteration is by binding id, which keeps the order
/// deferred runs start in deterministic.
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    pending: BTreeSet<BindingId>,
}

impl TriggerQueue {
    pub fn new(behaviour: TriggerWhileRunningBehaviour) -> Self {
        Self {
            behaviour,
            pending: BTreeSet::new(),
        }
    }

    pub fn behaviour(&self) -> TriggerWhileRunningBehaviour {
        self.behaviour
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, binding: BindingId) -> bool {
        self.pending.contains(&binding)
    }

    /// Record a trigger for a binding whose own run is in flight.
    ///
    /// Returns whether a follow-up is now pending.
    pub fn record_trigger(&mut self, binding: BindingId) -> bool {
        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                let inserted = self.pending.insert(binding);
                debug!(binding, coalesced = !inserted, "queued follow-up run");
                true
            }
            TriggerWhileRunningBehaviour::Skip => {
                debug!(binding, "run in flight; trigger skipped");
                false
            }
        }
    }

    /// Hold back an idle binding that conflicts with another binding's run.
    ///
    /// Always queued regardless of behaviour: the binding itself is not
    /// running, so the change would otherwise never be built.
    pub fn defer(&mut self, binding: BindingId) {
        self.pending.insert(binding);
        debug!(binding, "deferred until shared tasks are free");
    }

    /// Clear the pending flag; returns whether it was set.
    pub fn take(&mut self, binding: BindingId) -> bool {
        self.pending.remove(&binding)
    }

    pub fn pending(&self) -> impl Iterator<Item = BindingId> + '_ {
        self.pending.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_mode_coalesces() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue);
        assert!(q.record_trigger(2));
        assert!(q.record_trigger(2));
        assert!(q.record_trigger(0));
        assert_eq!(q.pending().collect::<Vec<_>>(), vec![0, 2]);
        assert!(q.take(2));
        assert!(!q.take(2));
    }

    #[test]
    fn skip_mode_drops_but_defer_still_queues() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Skip);
        assert!(!q.record_trigger(1));
        assert!(q.is_empty());
        q.defer(1);
        assert!(q.is_pending(1));
    }
}

//! State store with optional idle-time batching and bounded history.
//!
//! # Update paths
//!
//! - **Immediate**: batching disabled, or no idle scheduling capability. The
//!   patch applies on the calling turn.
//! - **Batched**: the patch is queued and a single flush is scheduled through
//!   a [`FlushScheduler`]. The flush merges every queued patch (last writer
//!   wins per key), applies them as one update, records one history entry and
//!   emits one [`RuntimeEvent::StateChanged`].
//!
//! An update that leaves the snapshot unchanged records nothing and emits
//! nothing.
//!
//! Every mutating method returns the number of `state:change` listeners that
//! failed, so the owner can record them.

use super::history::{BoundedHistoryLog, HistoryChange, HistoryEntry};
use super::snapshot::{StateDiff, StatePatch, StateSnapshot};
use crate::domain::error::Result;
use crate::events::{EventBus, RuntimeEvent};
use crate::platform::capabilities::IdleScheduling;
use crate::platform::scheduler::TimerId;
use std::rc::Rc;

/// Schedules the deferred flush. Decouples the store from any particular
/// timer or idle primitive.
pub trait FlushScheduler {
    fn schedule_flush(&mut self, delay_ms: u64) -> TimerId;
    fn cancel_flush(&mut self, id: TimerId);
}

/// Store behavior derived from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub batch_updates: bool,
    pub diff_history: bool,
    pub history_size: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            batch_updates: false,
            diff_history: true,
            history_size: super::history::DEFAULT_HISTORY_SIZE,
        }
    }
}

#[derive(Debug)]
pub struct StateStore {
    current: Rc<StateSnapshot>,
    queue: Vec<StatePatch>,
    scheduled: Option<TimerId>,
    history: BoundedHistoryLog<HistoryEntry>,
    options: StoreOptions,
    idle: IdleScheduling,
}

impl StateStore {
    #[must_use]
    pub fn new(options: StoreOptions, idle: IdleScheduling) -> Self {
        Self {
            current: Rc::new(StateSnapshot::default()),
            queue: Vec::new(),
            scheduled: None,
            history: BoundedHistoryLog::new(options.history_size),
            options,
            idle,
        }
    }

    /// The current snapshot. Queued patches are not visible until flushed.
    #[must_use]
    pub fn get_state(&self) -> Rc<StateSnapshot> {
        Rc::clone(&self.current)
    }

    /// History entries, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.to_vec()
    }

    /// History serialized as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if an entry cannot be encoded.
    pub fn history_json(&self) -> Result<String> {
        let entries: Vec<&HistoryEntry> = self.history.iter().collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    #[must_use]
    pub const fn options(&self) -> StoreOptions {
        self.options
    }

    #[must_use]
    pub const fn idle(&self) -> IdleScheduling {
        self.idle
    }

    /// Queues or applies `patch` depending on batching and capabilities.
    pub fn set_state(
        &mut self,
        patch: StatePatch,
        scheduler: &mut dyn FlushScheduler,
        bus: &mut EventBus<RuntimeEvent>,
    ) -> usize {
        if patch.is_empty() {
            return 0;
        }
        let delay = if self.options.batch_updates {
            self.idle.flush_delay()
        } else {
            None
        };
        match delay {
            Some(delay_ms) => {
                self.queue.push(patch);
                if self.scheduled.is_none() {
                    self.scheduled = Some(scheduler.schedule_flush(delay_ms));
                    tracing::trace!(delay_ms, "state flush scheduled");
                }
                0
            }
            None => self.apply(&patch, bus),
        }
    }

    /// Applies every queued patch as one update.
    pub fn flush_updates(&mut self, scheduler: &mut dyn FlushScheduler, bus: &mut EventBus<RuntimeEvent>) -> usize {
        if let Some(id) = self.scheduled.take() {
            scheduler.cancel_flush(id);
        }
        self.drain_queue(bus)
    }

    /// Called when the scheduled flush timer fires.
    pub fn on_flush_due(&mut self, bus: &mut EventBus<RuntimeEvent>) -> usize {
        self.scheduled = None;
        self.drain_queue(bus)
    }

    fn drain_queue(&mut self, bus: &mut EventBus<RuntimeEvent>) -> usize {
        if self.queue.is_empty() {
            return 0;
        }
        let queued = self.queue.len();
        let mut merged = StatePatch::new();
        for patch in self.queue.drain(..) {
            merged.merge(patch);
        }
        tracing::debug!(queued, "flushing batched state updates");
        self.apply(&merged, bus)
    }

    fn apply(&mut self, patch: &StatePatch, bus: &mut EventBus<RuntimeEvent>) -> usize {
        let next = patch.apply(&self.current);
        if next == *self.current {
            return 0;
        }
        self.record(&next);
        self.current = Rc::new(next);
        bus.emit(&RuntimeEvent::StateChanged(Rc::clone(&self.current)))
    }

    fn record(&mut self, next: &StateSnapshot) {
        if self.history.capacity() == 0 {
            return;
        }
        let change = if self.options.diff_history {
            match StateDiff::between(&self.current, next) {
                Ok(diff) => HistoryChange::Diff(diff),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to diff state, history entry skipped");
                    return;
                }
            }
        } else {
            HistoryChange::Snapshot {
                old: Box::new((*self.current).clone()),
                new: Box::new(next.clone()),
            }
        };
        self.history.push(HistoryEntry {
            timestamp: chrono::Utc::now(),
            change,
        });
    }

    /// Updates options at runtime.
    ///
    /// Turning batching off flushes anything queued right away.
    pub fn set_options(
        &mut self,
        options: StoreOptions,
        scheduler: &mut dyn FlushScheduler,
        bus: &mut EventBus<RuntimeEvent>,
    ) -> usize {
        let was_batching = self.options.batch_updates;
        self.options = options;
        self.history.set_capacity(options.history_size);
        if was_batching && !options.batch_updates {
            self.flush_updates(scheduler, bus)
        } else {
            0
        }
    }

    /// Cancels any pending flush, resets to the initial state, clears history
    /// and emits one final state change.
    pub fn clear(&mut self, scheduler: &mut dyn FlushScheduler, bus: &mut EventBus<RuntimeEvent>) -> usize {
        if let Some(id) = self.scheduled.take() {
            scheduler.cancel_flush(id);
        }
        self.queue.clear();
        self.history.clear();
        self.current = Rc::new(StateSnapshot::default());
        bus.emit(&RuntimeEvent::StateChanged(Rc::clone(&self.current)))
    }
}

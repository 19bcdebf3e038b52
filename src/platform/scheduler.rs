//! Virtual-time timer queue.
//!
//! The runtime never reads a wall clock to decide when work runs. The host
//! advances time explicitly (from `requestAnimationFrame`, a real timer, or a
//! test) and the queue hands back due tasks one at a time, so a task that
//! schedules another task inside the same window still fires within it.
//!
//! Ordering: earliest deadline first, ties broken by scheduling order.

use std::collections::{BTreeMap, HashMap};

/// Handle returned by [`TimerQueue::schedule`], used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Deadline-ordered queue of pending tasks.
#[derive(Debug)]
pub struct TimerQueue<T> {
    now_ms: u64,
    next_seq: u64,
    pending: BTreeMap<(u64, u64), T>,
    deadlines: HashMap<u64, u64>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Current virtual time in milliseconds.
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.now_ms
    }

    /// Schedules `task` to run `delay_ms` from now.
    pub fn schedule(&mut self, delay_ms: u64, task: T) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let deadline = self.now_ms.saturating_add(delay_ms);
        self.pending.insert((deadline, seq), task);
        self.deadlines.insert(seq, deadline);
        TimerId(seq)
    }

    /// Cancels a pending timer, returning its task if it had not fired.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let deadline = self.deadlines.remove(&id.0)?;
        self.pending.remove(&(deadline, id.0))
    }

    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id.0)
    }

    /// Pops the earliest task due at or before `until`, moving the clock to
    /// its deadline.
    pub fn pop_due(&mut self, until: u64) -> Option<(TimerId, T)> {
        let (&(deadline, seq), _) = self.pending.iter().next()?;
        if deadline > until {
            return None;
        }
        let task = self.pending.remove(&(deadline, seq))?;
        self.deadlines.remove(&seq);
        self.now_ms = self.now_ms.max(deadline);
        Some((TimerId(seq), task))
    }

    /// Moves the clock forward without running anything. Never goes back.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Cancels everything, returning how many timers were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.deadlines.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_deadline_then_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(20, "late");
        timers.schedule(10, "first");
        timers.schedule(10, "second");

        let mut fired = vec![];
        while let Some((_, task)) = timers.pop_due(100) {
            fired.push(task);
        }
        assert_eq!(fired, vec!["first", "second", "late"]);
        assert_eq!(timers.now(), 20);
    }

    #[test]
    fn respects_window() {
        let mut timers = TimerQueue::new();
        timers.schedule(50, 1);
        assert!(timers.pop_due(49).is_none());
        timers.set_now(49);
        assert_eq!(timers.pop_due(50).map(|(_, t)| t), Some(1));
    }

    #[test]
    fn cancel_removes_task() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule(5, "x");
        assert!(timers.is_pending(id));
        assert_eq!(timers.cancel(id), Some("x"));
        assert_eq!(timers.cancel(id), None);
        assert!(timers.pop_due(10).is_none());
    }

    #[test]
    fn delays_are_relative_to_now() {
        let mut timers = TimerQueue::new();
        timers.set_now(100);
        timers.schedule(10, ());
        assert_eq!(timers.next_deadline(), Some(110));
        timers.set_now(50);
        assert_eq!(timers.now(), 100);
        assert_eq!(timers.clear(), 1);
        assert!(timers.is_empty());
    }
}

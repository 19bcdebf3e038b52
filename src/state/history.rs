//! Bounded history of applied state updates.

use super::snapshot::{StateDiff, StateSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of history entries kept.
pub const DEFAULT_HISTORY_SIZE: usize = 20;

/// Fixed-capacity ring buffer. Pushing into a full log silently drops the
/// oldest entry; a zero-capacity log records nothing.
#[derive(Debug, Clone)]
pub struct BoundedHistoryLog<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T: Clone> BoundedHistoryLog<T> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Changes the capacity, dropping the oldest entries if it shrinks.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.entries.len() > capacity {
            self.entries.pop_front();
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Entries oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// What one history entry captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HistoryChange {
    /// Changed keys only; cheap but not replayable into full states.
    Diff(StateDiff),
    /// Full before/after copies.
    Snapshot {
        old: Box<StateSnapshot>,
        new: Box<StateSnapshot>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub change: HistoryChange,
}

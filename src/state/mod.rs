//! Coordination state, its update scheduler and its history.
//!
//! - [`snapshot`]: immutable snapshots, shallow patches and per-key diffs
//! - [`history`]: bounded ring buffer of applied updates
//! - [`store`]: the store itself, with idle-time batching

pub mod history;
pub mod snapshot;
pub mod store;

pub use history::{BoundedHistoryLog, HistoryChange, HistoryEntry};
pub use snapshot::{FieldChange, StateDiff, StatePatch, StateSnapshot};
pub use store::{FlushScheduler, StateStore, StoreOptions};

//! Toast notifications: a capped visible set with a FIFO overflow queue.

pub mod queue;

pub use queue::{ToastQueue, DEFAULT_MAX_TOASTS, DEFAULT_TOAST_DURATION_MS, DEFAULT_TOAST_EXIT_DELAY_MS};

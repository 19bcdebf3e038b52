//! Deferred work scheduled on the kernel's timer queue.
//!
//! Components never call back into the kernel from a timer. They schedule a
//! [`Task`] instead, and [`Kernel::advance`](super::Kernel::advance) routes
//! each due task to its owner in deadline order.

use crate::domain::toast::ToastId;
use crate::platform::scheduler::{TimerId, TimerQueue};
use crate::state::FlushScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Apply the state store's queued patches.
    FlushState,
    /// A toast's display duration elapsed; start its exit.
    ExpireToast(ToastId),
    /// A leaving toast's exit delay elapsed; remove its node.
    RemoveToast(ToastId),
}

impl FlushScheduler for TimerQueue<Task> {
    fn schedule_flush(&mut self, delay_ms: u64) -> TimerId {
        self.schedule(delay_ms, Task::FlushState)
    }

    fn cancel_flush(&mut self, id: TimerId) {
        self.cancel(id);
    }
}

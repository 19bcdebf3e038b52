//! Capped, FIFO toast display.
//!
//! # Lifecycle
//!
//! ```text
//! show() ──▶ Queued ──(slot frees)──▶ Visible ──(duration)──▶ Leaving ──(exit delay)──▶ removed
//!    └──────────(under cap)───────────────┘
//! ```
//!
//! A leaving toast still occupies its slot until its node is removed, so the
//! number of toast nodes in the document never exceeds the cap.
//!
//! # Invariants
//!
//! - Toasts become visible in `show()` call order. A new toast never
//!   overtakes a queued one: promotion always drains the queue head first.
//! - A cap of `0` disables the limit; nothing is ever queued.
//! - The visible list is the source of truth. The store's `toasts` field is a
//!   mirror rewritten after every change to the visible list.

use crate::builders::SurfaceBuilder;
use crate::domain::error::Result;
use crate::domain::toast::{ToastEntry, ToastId, ToastKind};
use crate::events::RuntimeEvent;
use crate::kernel::{Services, Task};
use crate::platform::dom::NodeId;
use crate::platform::scheduler::TimerId;
use crate::state::StatePatch;
use std::collections::VecDeque;

pub const CONTAINER_CLASS: &str = "layerkit-toasts";
pub const LEAVING_CLASS: &str = "toast-leaving";

pub const DEFAULT_MAX_TOASTS: usize = 3;
pub const DEFAULT_TOAST_DURATION_MS: u64 = 3000;
pub const DEFAULT_TOAST_EXIT_DELAY_MS: u64 = 200;

#[derive(Debug)]
struct VisibleToast {
    entry: ToastEntry,
    node: NodeId,
    timer: Option<TimerId>,
    leaving: bool,
}

#[derive(Debug)]
pub struct ToastQueue {
    container: Option<NodeId>,
    visible: Vec<VisibleToast>,
    queue: VecDeque<ToastEntry>,
    next_id: u64,
    shown_total: u64,
    max_visible: usize,
    exit_delay_ms: u64,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOASTS, DEFAULT_TOAST_EXIT_DELAY_MS)
    }
}

impl ToastQueue {
    #[must_use]
    pub const fn new(max_visible: usize, exit_delay_ms: u64) -> Self {
        Self {
            container: None,
            visible: Vec::new(),
            queue: VecDeque::new(),
            next_id: 0,
            shown_total: 0,
            max_visible,
            exit_delay_ms,
        }
    }

    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    /// Entries currently on screen, oldest first.
    #[must_use]
    pub fn visible(&self) -> Vec<ToastEntry> {
        self.visible.iter().map(|t| t.entry.clone()).collect()
    }

    /// Total toasts displayed over this queue's lifetime.
    #[must_use]
    pub const fn shown_total(&self) -> u64 {
        self.shown_total
    }

    #[must_use]
    pub const fn max_visible(&self) -> usize {
        self.max_visible
    }

    #[must_use]
    pub const fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn set_exit_delay(&mut self, exit_delay_ms: u64) {
        self.exit_delay_ms = exit_delay_ms;
    }

    /// Changes the cap. Raising it promotes queued toasts into the new slots;
    /// lowering it never evicts visible ones.
    pub fn set_max_visible(&mut self, svc: &mut Services, builder: &dyn SurfaceBuilder, max_visible: usize) {
        self.max_visible = max_visible;
        self.promote(svc, builder);
    }

    /// Displays a toast, or queues it when the cap is reached.
    pub fn show(
        &mut self,
        svc: &mut Services,
        builder: &dyn SurfaceBuilder,
        message: impl Into<String>,
        kind: ToastKind,
        duration_ms: u64,
    ) -> ToastId {
        self.next_id += 1;
        let entry = ToastEntry::new(ToastId(self.next_id), message, kind, duration_ms);
        let id = entry.id;

        if !self.has_free_slot() || !self.queue.is_empty() {
            tracing::debug!(
                id = id.get(),
                visible = self.visible.len(),
                queued = self.queue.len() + 1,
                "toast queued"
            );
            self.queue.push_back(entry);
            self.promote(svc, builder);
        } else {
            self.display(svc, builder, entry);
        }
        id
    }

    fn ensure_container(&mut self, svc: &mut Services) -> Result<NodeId> {
        if let Some(container) = self.container {
            if svc.doc.is_attached(container) {
                return Ok(container);
            }
        }
        let body = svc.doc.require_body("toast container")?;
        let container = svc.doc.create_element("div");
        svc.doc.add_class(container, CONTAINER_CLASS);
        svc.doc.set_attribute(container, "aria-live", "polite");
        svc.doc.append_child(body, container)?;
        self.container = Some(container);
        Ok(container)
    }

    fn display(&mut self, svc: &mut Services, builder: &dyn SurfaceBuilder, entry: ToastEntry) -> bool {
        let mounted = self.ensure_container(svc).and_then(|container| {
            let node = builder.toast(&mut svc.doc, &entry)?;
            svc.doc.append_child(container, node)?;
            Ok(node)
        });
        let node = match mounted {
            Ok(node) => node,
            Err(e) => {
                svc.record_error("toast", &e);
                return false;
            }
        };

        let timer = svc.timers.schedule(entry.duration_ms, Task::ExpireToast(entry.id));
        self.shown_total += 1;
        tracing::debug!(id = entry.id.get(), kind = entry.kind.as_str(), "toast shown");
        self.visible.push(VisibleToast {
            entry: entry.clone(),
            node,
            timer: Some(timer),
            leaving: false,
        });
        self.mirror(svc);
        svc.emit(&RuntimeEvent::ToastShown(entry));
        true
    }

    /// A cap of `0` means no cap.
    fn has_free_slot(&self) -> bool {
        self.max_visible == 0 || self.visible.len() < self.max_visible
    }

    /// Fills free slots from the queue head.
    fn promote(&mut self, svc: &mut Services, builder: &dyn SurfaceBuilder) {
        while self.has_free_slot() {
            let Some(entry) = self.queue.pop_front() else {
                break;
            };
            self.display(svc, builder, entry);
        }
    }

    /// A toast's display duration elapsed.
    pub fn on_expire(&mut self, svc: &mut Services, builder: &dyn SurfaceBuilder, id: ToastId) {
        let exit_delay = self.exit_delay_ms;
        let Some(toast) = self.visible.iter_mut().find(|t| t.entry.id == id && !t.leaving) else {
            return;
        };
        toast.leaving = true;
        toast.timer = None;
        svc.doc.add_class(toast.node, LEAVING_CLASS);
        if exit_delay == 0 {
            self.on_remove(svc, builder, id);
        } else {
            toast.timer = Some(svc.timers.schedule(exit_delay, Task::RemoveToast(id)));
        }
    }

    /// A leaving toast's exit delay elapsed.
    pub fn on_remove(&mut self, svc: &mut Services, builder: &dyn SurfaceBuilder, id: ToastId) {
        let Some(index) = self.visible.iter().position(|t| t.entry.id == id) else {
            return;
        };
        let toast = self.visible.remove(index);
        if let Some(timer) = toast.timer {
            svc.timers.cancel(timer);
        }
        svc.doc.remove(toast.node);
        tracing::debug!(id = id.get(), "toast hidden");
        self.mirror(svc);
        svc.emit(&RuntimeEvent::ToastHidden(toast.entry));
        self.promote(svc, builder);
    }

    /// Dismisses a toast early. Queued toasts are dropped without ever being
    /// shown; visible ones start their exit now.
    pub fn dismiss(&mut self, svc: &mut Services, builder: &dyn SurfaceBuilder, id: ToastId) -> bool {
        if let Some(pos) = self.queue.iter().position(|e| e.id == id) {
            self.queue.remove(pos);
            return true;
        }
        let Some(toast) = self.visible.iter_mut().find(|t| t.entry.id == id) else {
            return false;
        };
        if toast.leaving {
            return true;
        }
        if let Some(timer) = toast.timer.take() {
            svc.timers.cancel(timer);
        }
        self.on_expire(svc, builder, id);
        true
    }

    /// Cancels every timer, removes every toast node and empties the queue.
    pub fn clear_all(&mut self, svc: &mut Services) {
        let dropped = self.queue.len();
        self.queue.clear();
        if self.visible.is_empty() {
            if dropped > 0 {
                tracing::debug!(dropped, "toast queue cleared");
            }
            return;
        }
        let removed: Vec<VisibleToast> = self.visible.drain(..).collect();
        for toast in &removed {
            if let Some(timer) = toast.timer {
                svc.timers.cancel(timer);
            }
            svc.doc.remove(toast.node);
        }
        tracing::debug!(removed = removed.len(), dropped, "toasts cleared");
        self.mirror(svc);
        for toast in removed {
            svc.emit(&RuntimeEvent::ToastHidden(toast.entry));
        }
    }

    /// Clears everything and removes the container.
    pub fn destroy(&mut self, svc: &mut Services) {
        self.clear_all(svc);
        if let Some(container) = self.container.take() {
            svc.doc.remove(container);
        }
    }

    fn mirror(&self, svc: &mut Services) {
        svc.set_state(
            StatePatch::new()
                .toasts(self.visible())
                .toasts_shown(self.shown_total),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::DefaultBuilder;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn advance(svc: &mut Services, toasts: &mut ToastQueue, ms: u64) {
        let until = svc.timers.now() + ms;
        while let Some((_, task)) = svc.timers.pop_due(until) {
            match task {
                Task::ExpireToast(id) => toasts.on_expire(svc, &DefaultBuilder, id),
                Task::RemoveToast(id) => toasts.on_remove(svc, &DefaultBuilder, id),
                Task::FlushState => svc.on_flush_due(),
            }
        }
        svc.timers.set_now(until);
    }

    fn messages(svc: &Services, toasts: &ToastQueue) -> Vec<String> {
        let container = toasts.container().unwrap();
        svc.doc
            .children(container)
            .iter()
            .map(|n| svc.doc.text(*n).to_string())
            .collect()
    }

    #[test]
    fn caps_visible_and_queues_overflow() {
        let mut svc = Services::default();
        let mut toasts = ToastQueue::new(2, 0);
        for msg in ["a", "b", "c", "d"] {
            toasts.show(&mut svc, &DefaultBuilder, msg, ToastKind::Info, 100);
        }
        assert_eq!(toasts.visible_count(), 2);
        assert_eq!(toasts.queued_count(), 2);
        assert_eq!(messages(&svc, &toasts), vec!["a", "b"]);

        advance(&mut svc, &mut toasts, 100);
        assert_eq!(messages(&svc, &toasts), vec!["c", "d"]);
        assert_eq!(toasts.queued_count(), 0);

        advance(&mut svc, &mut toasts, 100);
        assert_eq!(toasts.visible_count(), 0);
        assert_eq!(toasts.shown_total(), 4);
    }

    #[test]
    fn leaving_toast_keeps_its_slot_until_removed() {
        let mut svc = Services::default();
        let mut toasts = ToastQueue::new(1, 200);
        let first = toasts.show(&mut svc, &DefaultBuilder, "first", ToastKind::Info, 100);
        toasts.show(&mut svc, &DefaultBuilder, "second", ToastKind::Info, 100);

        advance(&mut svc, &mut toasts, 100);
        let node = svc.doc.children(toasts.container().unwrap())[0];
        assert!(svc.doc.has_class(node, LEAVING_CLASS));
        assert_eq!(toasts.visible()[0].id, first);
        assert_eq!(toasts.queued_count(), 1);

        advance(&mut svc, &mut toasts, 200);
        assert_eq!(messages(&svc, &toasts), vec!["second"]);
    }

    #[test]
    fn events_and_state_mirror_follow_visible_list() {
        let mut svc = Services::default();
        let names: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let seen = Rc::clone(&names);
        svc.bus.subscribe(move |event: &RuntimeEvent| {
            if !matches!(event, RuntimeEvent::StateChanged(_)) {
                seen.borrow_mut().push(event.name());
            }
            Ok(())
        });

        let mut toasts = ToastQueue::new(3, 0);
        toasts.show(&mut svc, &DefaultBuilder, "saved", ToastKind::Success, 50);
        assert_eq!(svc.store.get_state().toasts.len(), 1);
        assert_eq!(svc.store.get_state().toasts_shown, 1);

        advance(&mut svc, &mut toasts, 50);
        assert!(svc.store.get_state().toasts.is_empty());
        assert_eq!(*names.borrow(), vec!["toast:show", "toast:hide"]);
    }

    #[test]
    fn clear_all_cancels_timers_and_is_safe_when_empty() {
        let mut svc = Services::default();
        let mut toasts = ToastQueue::new(1, 0);
        toasts.clear_all(&mut svc);

        toasts.show(&mut svc, &DefaultBuilder, "a", ToastKind::Info, 100);
        toasts.show(&mut svc, &DefaultBuilder, "b", ToastKind::Info, 100);
        toasts.clear_all(&mut svc);

        assert_eq!(toasts.visible_count(), 0);
        assert_eq!(toasts.queued_count(), 0);
        assert!(svc.timers.is_empty());
        assert!(svc.doc.children(toasts.container().unwrap()).is_empty());
    }

    #[test]
    fn raising_the_cap_promotes_queued_toasts() {
        let mut svc = Services::default();
        let mut toasts = ToastQueue::new(1, 0);
        for msg in ["a", "b", "c"] {
            toasts.show(&mut svc, &DefaultBuilder, msg, ToastKind::Info, 100);
        }
        toasts.set_max_visible(&mut svc, &DefaultBuilder, 3);
        assert_eq!(messages(&svc, &toasts), vec!["a", "b", "c"]);
    }

    #[test]
    fn zero_cap_shows_every_toast() {
        let mut svc = Services::default();
        let mut toasts = ToastQueue::new(0, 0);
        for msg in ["a", "b", "c", "d", "e"] {
            toasts.show(&mut svc, &DefaultBuilder, msg, ToastKind::Info, 100);
        }
        assert_eq!(toasts.visible_count(), 5);
        assert_eq!(toasts.queued_count(), 0);

        advance(&mut svc, &mut toasts, 100);
        assert_eq!(toasts.visible_count(), 0);
        assert_eq!(toasts.shown_total(), 5);
    }

    #[test]
    fn dismiss_handles_queued_and_visible() {
        let mut svc = Services::default();
        let mut toasts = ToastQueue::new(1, 0);
        let a = toasts.show(&mut svc, &DefaultBuilder, "a", ToastKind::Info, 1000);
        let b = toasts.show(&mut svc, &DefaultBuilder, "b", ToastKind::Info, 1000);
        toasts.show(&mut svc, &DefaultBuilder, "c", ToastKind::Info, 1000);

        assert!(toasts.dismiss(&mut svc, &DefaultBuilder, b));
        assert!(toasts.dismiss(&mut svc, &DefaultBuilder, a));
        assert_eq!(messages(&svc, &toasts), vec!["c"]);
        assert!(!toasts.dismiss(&mut svc, &DefaultBuilder, ToastId(99)));
    }

    #[test]
    fn missing_body_records_an_error_instead_of_failing() {
        let mut svc = Services {
            doc: crate::platform::Document::loading(),
            ..Services::default()
        };
        let mut toasts = ToastQueue::default();
        toasts.show(&mut svc, &DefaultBuilder, "early", ToastKind::Info, 100);
        assert_eq!(toasts.visible_count(), 0);
        assert_eq!(svc.errors.len(), 1);
    }
}

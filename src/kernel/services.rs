//! Collaborators shared by every component.
//!
//! The kernel owns one [`Services`] value. Components that need the document,
//! bus, timers and store together take `&mut Services` for the duration of a
//! call instead of holding references to each other; field-level borrows keep
//! them disjoint.

use super::tasks::Task;
use crate::domain::error::{ErrorRecord, LayerkitError};
use crate::events::{EventBus, EventTopic, RuntimeEvent};
use crate::focus::FocusableElementCache;
use crate::layers::OverlayManager;
use crate::observability::ErrorLog;
use crate::platform::capabilities::PlatformCapabilities;
use crate::platform::dom::Document;
use crate::platform::scheduler::TimerQueue;
use crate::state::{StatePatch, StateStore, StoreOptions};

#[derive(Debug)]
pub struct Services {
    pub doc: Document,
    pub bus: EventBus<RuntimeEvent>,
    pub timers: TimerQueue<Task>,
    pub store: StateStore,
    pub overlay: OverlayManager,
    pub focus: FocusableElementCache,
    pub errors: ErrorLog,
    pub capabilities: PlatformCapabilities,
}

impl Services {
    #[must_use]
    pub fn new(
        doc: Document,
        capabilities: PlatformCapabilities,
        store_options: StoreOptions,
        include_content_editable: bool,
    ) -> Self {
        Self {
            doc,
            bus: EventBus::new(),
            timers: TimerQueue::new(),
            store: StateStore::new(store_options, capabilities.idle),
            overlay: OverlayManager::new(),
            focus: FocusableElementCache::new(capabilities.mutation, include_content_editable),
            errors: ErrorLog::new(),
            capabilities,
        }
    }

    /// Routes `patch` through the store with the timer queue as flush
    /// scheduler.
    pub fn set_state(&mut self, patch: StatePatch) {
        let failures = self.store.set_state(patch, &mut self.timers, &mut self.bus);
        self.note_listener_failures(EventTopic::StateChange.name(), failures);
    }

    /// Applies every queued state patch now.
    pub fn flush_state(&mut self) {
        let failures = self.store.flush_updates(&mut self.timers, &mut self.bus);
        self.note_listener_failures(EventTopic::StateChange.name(), failures);
    }

    /// Runs the store's scheduled flush.
    pub fn on_flush_due(&mut self) {
        let failures = self.store.on_flush_due(&mut self.bus);
        self.note_listener_failures(EventTopic::StateChange.name(), failures);
    }

    pub fn set_store_options(&mut self, options: StoreOptions) {
        let failures = self.store.set_options(options, &mut self.timers, &mut self.bus);
        self.note_listener_failures(EventTopic::StateChange.name(), failures);
    }

    /// Resets the store to its initial state.
    pub fn clear_state(&mut self) {
        let failures = self.store.clear(&mut self.timers, &mut self.bus);
        self.note_listener_failures(EventTopic::StateChange.name(), failures);
    }

    /// Emits `event`. Listener failures are recorded, never propagated.
    pub fn emit(&mut self, event: &RuntimeEvent) {
        let failures = self.bus.emit(event);
        self.note_listener_failures(event.name(), failures);
    }

    fn note_listener_failures(&mut self, event: &str, failures: usize) {
        if failures == 0 {
            return;
        }
        let error = LayerkitError::Callback {
            hook: format!("{event} listener"),
            message: format!("{failures} listener(s) failed"),
        };
        self.errors.note("emit", &error);
    }

    /// Records a failure caught at a boundary.
    pub fn record_error(&mut self, context: &str, error: &LayerkitError) -> ErrorRecord {
        self.errors.record(&mut self.bus, context, error)
    }
}

#[cfg(test)]
impl Default for Services {
    fn default() -> Self {
        Self::new(
            Document::new(),
            PlatformCapabilities::browser(),
            StoreOptions::default(),
            false,
        )
    }
}

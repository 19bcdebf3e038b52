//! Generic synchronous publish/subscribe bus.
//!
//! Listeners run in subscription order on the emitting call. A listener that
//! returns an error or panics is logged and skipped; the remaining listeners
//! still run and the emitter never observes the failure.

use crate::domain::layer::{run_guarded, BoxError};

/// Result type returned by listeners.
pub type ListenerResult = Result<(), BoxError>;

type Listener<E> = Box<dyn FnMut(&E) -> ListenerResult>;

/// Handle used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscriber<E> {
    id: SubscriptionId,
    listener: Listener<E>,
}

/// Synchronous event bus over event type `E`.
pub struct EventBus<E> {
    subscribers: Vec<Subscriber<E>>,
    next_id: u64,
}

impl<E: std::fmt::Debug> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: std::fmt::Debug> EventBus<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 1,
        }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&E) -> ListenerResult + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            listener: Box::new(listener),
        });
        id
    }

    /// Removes a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Delivers `event` to every listener, returning how many failed.
    pub fn emit(&mut self, event: &E) -> usize {
        let mut failures = 0;
        for subscriber in &mut self.subscribers {
            let listener = &mut subscriber.listener;
            if let Err(e) = run_guarded("listener", || (*listener)(event)) {
                failures += 1;
                tracing::warn!(subscription = subscriber.id.0, error = %e, event = ?event, "event listener failed");
            }
        }
        failures
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn delivers_in_subscription_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for tag in ["a", "b"] {
            let seen = Rc::clone(&seen);
            bus.subscribe(move |e: &u32| {
                seen.borrow_mut().push(format!("{tag}{e}"));
                Ok(())
            });
        }
        assert_eq!(bus.emit(&7), 0);
        assert_eq!(*seen.borrow(), vec!["a7", "b7"]);
    }

    #[test]
    fn failing_listeners_are_isolated() {
        let hits = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        bus.subscribe(|_: &u32| Err("bad".into()));
        bus.subscribe(|_: &u32| panic!("worse"));
        let counter = Rc::clone(&hits);
        bus.subscribe(move |_: &u32| {
            *counter.borrow_mut() += 1;
            Ok(())
        });
        assert_eq!(bus.emit(&1), 2);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hits = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let counter = Rc::clone(&hits);
        let id = bus.subscribe(move |_: &u32| {
            *counter.borrow_mut() += 1;
            Ok(())
        });
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&1);
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(bus.listener_count(), 0);
    }
}

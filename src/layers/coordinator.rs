//! Single-active-layer state machine.
//!
//! The coordinator owns the one layer slot shared by dialogs, sheets and the
//! loader. It moves between two states:
//!
//! ```text
//!        open()                    close()
//! Idle ─────────▶ Open(layer) ─────────────▶ Idle
//!                    │   ▲
//!                    └───┘ open() closes the current layer first
//! ```
//!
//! # Invariants
//!
//! - At most one layer element is mounted under the overlay at any time.
//! - Opening while a layer is open runs the full close sequence first, in the
//!   same call, so the old layer's `on_close` always runs before the new
//!   layer's `on_open`.
//! - Caller callbacks cannot break the state machine: errors and panics are
//!   caught, recorded, and the transition completes anyway.
//!
//! # Side-effect order
//!
//! Open: state store, mount under overlay, show overlay, focus trap,
//! `on_open`, [`RuntimeEvent::LayerOpened`].
//!
//! Close: focus trap release, `on_close`, unmount, hide overlay, state store,
//! [`RuntimeEvent::LayerClosed`].

use crate::domain::error::{LayerkitError, Result};
use crate::domain::layer::{run_guarded, LayerCallback, LayerId, LayerMeta, LayerSnapshot};
use crate::events::RuntimeEvent;
use crate::focus::{FocusTrap, TabOutcome};
use crate::kernel::Services;
use crate::platform::dom::NodeId;
use crate::state::StatePatch;

/// Per-open behavior switches taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerSettings {
    pub focus_trap: bool,
    pub close_on_overlay_click: bool,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            focus_trap: true,
            close_on_overlay_click: true,
        }
    }
}

/// Result of a successful [`LayerCoordinator::open`].
#[derive(Debug, Clone, PartialEq)]
pub struct OpenOutcome {
    pub id: LayerId,
    /// The layer that was closed to make room, if any.
    pub replaced: Option<LayerSnapshot>,
}

struct ActiveLayer {
    snapshot: LayerSnapshot,
    on_close: Option<LayerCallback>,
    trap: Option<FocusTrap>,
}

#[derive(Default)]
pub struct LayerCoordinator {
    active: Option<ActiveLayer>,
    next_id: u64,
    opened_total: u64,
}

impl std::fmt::Debug for LayerCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerCoordinator")
            .field("active", &self.active.as_ref().map(|a| &a.snapshot))
            .field("opened_total", &self.opened_total)
            .finish()
    }
}

impl LayerCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn has_active_layer(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn active(&self) -> Option<&LayerSnapshot> {
        self.active.as_ref().map(|a| &a.snapshot)
    }

    /// Total layers opened over this coordinator's lifetime.
    #[must_use]
    pub const fn opened_total(&self) -> u64 {
        self.opened_total
    }

    /// Mounts `element` as the active layer.
    ///
    /// # Errors
    ///
    /// Returns [`LayerkitError::Precondition`] if the overlay cannot
    /// be created (no body), and [`LayerkitError::Dom`] if `element`
    /// cannot be mounted. Nothing is closed or mutated in either case.
    pub fn open(
        &mut self,
        svc: &mut Services,
        element: NodeId,
        meta: LayerMeta,
        settings: LayerSettings,
    ) -> Result<OpenOutcome> {
        let _span = tracing::debug_span!("layer_open", kind = %meta.kind).entered();

        let overlay = svc.overlay.create(&mut svc.doc)?;
        if element == overlay || svc.doc.contains(element, overlay) {
            return Err(LayerkitError::Dom(format!(
                "node {} cannot be mounted as a layer",
                element.index()
            )));
        }

        let replaced = self.close(svc);

        self.next_id += 1;
        self.opened_total += 1;
        let snapshot = LayerSnapshot {
            id: LayerId(self.next_id),
            kind: meta.kind,
            element,
            data: meta.data,
        };

        svc.set_state(
            StatePatch::new()
                .active_layer(Some(snapshot.clone()))
                .layers_opened(self.opened_total),
        );

        svc.doc.append_child(overlay, element)?;
        svc.overlay.show(&mut svc.doc, settings.close_on_overlay_click)?;

        let trap = settings
            .focus_trap
            .then(|| FocusTrap::activate(&mut svc.doc, &mut svc.focus, element));

        self.active = Some(ActiveLayer {
            snapshot: snapshot.clone(),
            on_close: meta.on_close,
            trap,
        });

        if let Some(on_open) = meta.on_open {
            if let Err(e) = run_guarded("on_open", || on_open(&snapshot)) {
                svc.record_error("on_open", &e);
            }
        }

        tracing::debug!(id = snapshot.id.get(), kind = %snapshot.kind, "layer opened");
        svc.emit(&RuntimeEvent::LayerOpened(snapshot.clone()));

        Ok(OpenOutcome {
            id: snapshot.id,
            replaced,
        })
    }

    /// Closes the active layer. No-op when idle.
    pub fn close(&mut self, svc: &mut Services) -> Option<LayerSnapshot> {
        let ActiveLayer {
            snapshot,
            on_close,
            trap,
        } = self.active.take()?;
        let _span = tracing::debug_span!("layer_close", id = snapshot.id.get()).entered();

        match trap {
            Some(trap) => trap.deactivate(&mut svc.doc, &mut svc.focus),
            None => svc.focus.unobserve(&mut svc.doc, snapshot.element),
        }

        if let Some(on_close) = on_close {
            if let Err(e) = run_guarded("on_close", || on_close(&snapshot)) {
                svc.record_error("on_close", &e);
            }
        }

        svc.doc.remove(snapshot.element);
        svc.overlay.hide(&mut svc.doc);
        svc.set_state(StatePatch::new().active_layer(None));

        tracing::debug!(kind = %snapshot.kind, "layer closed");
        svc.emit(&RuntimeEvent::LayerClosed(snapshot.clone()));
        Some(snapshot)
    }

    /// Routes a Tab press to the active layer's focus trap.
    pub fn handle_tab(&self, svc: &mut Services, shift: bool) -> TabOutcome {
        match self.active.as_ref().and_then(|a| a.trap.as_ref()) {
            Some(trap) => trap.handle_tab(&mut svc.doc, &mut svc.focus, shift),
            None => TabOutcome::PassThrough,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layer::{BoxError, LayerKind};
    use crate::layers::overlay::NO_SCROLL_CLASS;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn surface(svc: &mut Services) -> NodeId {
        let root = svc.doc.create_element("div");
        let button = svc.doc.create_element("button");
        svc.doc.append_child(root, button).unwrap();
        root
    }

    fn trigger(svc: &mut Services) -> NodeId {
        let body = svc.doc.body().unwrap();
        let button = svc.doc.create_element("button");
        svc.doc.append_child(body, button).unwrap();
        svc.doc.focus(button).unwrap();
        button
    }

    #[test]
    fn open_mounts_under_overlay_and_updates_state() {
        let mut svc = Services::default();
        let mut layers = LayerCoordinator::new();
        let element = surface(&mut svc);

        let outcome = layers
            .open(&mut svc, element, LayerMeta::new(LayerKind::Dialog), LayerSettings::default())
            .unwrap();

        assert!(layers.has_active_layer());
        assert!(outcome.replaced.is_none());
        let overlay = svc.overlay.element().unwrap();
        assert_eq!(svc.doc.parent(element), Some(overlay));
        assert!(svc.overlay.is_visible());
        assert_eq!(svc.store.get_state().active_layer.as_ref().map(|l| l.id), Some(outcome.id));
        assert_eq!(svc.store.get_state().layers_opened, 1);
    }

    #[test]
    fn second_open_closes_first_before_opening() {
        let mut svc = Services::default();
        let mut layers = LayerCoordinator::new();
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();

        let first = surface(&mut svc);
        let l = Rc::clone(&log);
        let meta = LayerMeta::new(LayerKind::Dialog).on_close(move |_| {
            l.borrow_mut().push("first:close");
            Ok(())
        });
        layers.open(&mut svc, first, meta, LayerSettings::default()).unwrap();

        let second = surface(&mut svc);
        let l = Rc::clone(&log);
        let meta = LayerMeta::new(LayerKind::Sheet).on_open(move |_| {
            l.borrow_mut().push("second:open");
            Ok(())
        });
        let outcome = layers.open(&mut svc, second, meta, LayerSettings::default()).unwrap();

        assert_eq!(*log.borrow(), vec!["first:close", "second:open"]);
        assert_eq!(outcome.replaced.map(|s| s.element), Some(first));
        assert!(!svc.doc.is_attached(first));
        assert!(svc.doc.is_attached(second));
        assert_eq!(svc.doc.children(svc.overlay.element().unwrap()), &[second]);
    }

    #[test]
    fn failing_callbacks_do_not_abort_transitions() {
        let mut svc = Services::default();
        let mut layers = LayerCoordinator::new();
        let element = surface(&mut svc);

        let meta = LayerMeta::new(LayerKind::Dialog)
            .on_open(|_| Err::<(), BoxError>("boom".into()))
            .on_close(|_| panic!("close hook panicked"));
        layers.open(&mut svc, element, meta, LayerSettings::default()).unwrap();
        assert!(layers.has_active_layer());

        let closed = layers.close(&mut svc);
        assert!(closed.is_some());
        assert!(!layers.has_active_layer());
        assert!(!svc.doc.is_attached(element));

        let contexts: Vec<String> = svc.errors.records().into_iter().map(|r| r.context).collect();
        assert_eq!(contexts, vec!["on_open", "on_close"]);
    }

    #[test]
    fn close_restores_focus_and_releases_overlay() {
        let mut svc = Services::default();
        let mut layers = LayerCoordinator::new();
        let trigger = trigger(&mut svc);
        let element = surface(&mut svc);

        layers
            .open(&mut svc, element, LayerMeta::new(LayerKind::Dialog), LayerSettings::default())
            .unwrap();
        let inside = svc.doc.active_element().unwrap();
        assert!(svc.doc.contains(element, inside));

        layers.close(&mut svc);
        assert_eq!(svc.doc.active_element(), Some(trigger));
        assert!(!svc.overlay.is_visible());
        assert!(!svc.doc.has_class(svc.doc.body().unwrap(), NO_SCROLL_CLASS));
        assert!(svc.store.get_state().active_layer.is_none());
        assert_eq!(svc.doc.observed_count(), 0);
    }

    #[test]
    fn close_when_idle_is_a_no_op() {
        let mut svc = Services::default();
        let mut layers = LayerCoordinator::new();
        assert!(layers.close(&mut svc).is_none());
        assert!(svc.store.history().is_empty());
    }

    #[test]
    fn focus_trap_can_be_disabled() {
        let mut svc = Services::default();
        let mut layers = LayerCoordinator::new();
        let trigger = trigger(&mut svc);
        let element = surface(&mut svc);
        let settings = LayerSettings {
            focus_trap: false,
            close_on_overlay_click: false,
        };

        layers
            .open(&mut svc, element, LayerMeta::new(LayerKind::Dialog), settings)
            .unwrap();
        assert_eq!(svc.doc.active_element(), Some(trigger));
        assert!(!svc.overlay.is_dismiss_armed());
        assert_eq!(layers.handle_tab(&mut svc, false), TabOutcome::PassThrough);
    }

    #[test]
    fn open_without_body_fails_cleanly() {
        let mut svc = Services {
            doc: crate::platform::Document::loading(),
            ..Services::default()
        };
        let mut layers = LayerCoordinator::new();
        let element = svc.doc.create_element("div");
        let err = layers
            .open(&mut svc, element, LayerMeta::new(LayerKind::Dialog), LayerSettings::default())
            .unwrap_err();
        assert!(err.is_precondition());
        assert!(!layers.has_active_layer());
    }

    #[test]
    fn emits_open_and_close_events_with_snapshot() {
        let mut svc = Services::default();
        let mut layers = LayerCoordinator::new();
        let names: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let seen = Rc::clone(&names);
        svc.bus.subscribe(move |event: &RuntimeEvent| {
            seen.borrow_mut().push(event.name());
            Ok(())
        });

        let element = surface(&mut svc);
        layers
            .open(&mut svc, element, LayerMeta::new(LayerKind::Loader), LayerSettings::default())
            .unwrap();
        layers.close(&mut svc);

        assert_eq!(
            *names.borrow(),
            vec!["state:change", "loader:show", "state:change", "loader:hide"]
        );
    }
}

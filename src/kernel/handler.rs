//! DOM event routing.
//!
//! The host forwards the document-level events the runtime cares about as
//! [`DomEvent`] values. [`Kernel::handle_event`] pattern-matches them and
//! drives the components; the returned [`EventOutcome`] tells the host
//! whether to suppress the browser's default action.
//!
//! # Event Types
//!
//! - **Keys**: Tab cycling inside the focus trap, the configurable close key,
//!   the optional dismiss-toasts key
//! - **Clicks**: confirm controls, `data-action="close"` controls inside the
//!   active layer, the backdrop
//! - **Readiness**: deferred initialization retry

use super::{Kernel, Lifecycle};
use crate::builders::ACTION_ATTRIBUTE;
use crate::focus::TabOutcome;
use crate::platform::dom::{Document, NodeId};

/// Document-level events forwarded by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEvent {
    /// A key went down. `key` uses DOM key names (`"Escape"`, `"Tab"`, `"q"`).
    KeyDown { key: String, shift: bool },
    /// A click whose innermost target is `target`.
    Click { target: NodeId },
    /// The document finished parsing its body.
    DocumentReady,
}

impl DomEvent {
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self::KeyDown {
            key: key.into(),
            shift: false,
        }
    }

    #[must_use]
    pub fn tab(shift: bool) -> Self {
        Self::KeyDown {
            key: "Tab".to_string(),
            shift,
        }
    }

    #[must_use]
    pub const fn click(target: NodeId) -> Self {
        Self::Click { target }
    }
}

/// What the runtime did with an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventOutcome {
    /// The runtime acted on the event.
    pub handled: bool,
    /// The host should cancel the browser's default action.
    pub prevent_default: bool,
}

impl EventOutcome {
    pub const IGNORED: Self = Self {
        handled: false,
        prevent_default: false,
    };

    const HANDLED: Self = Self {
        handled: true,
        prevent_default: false,
    };

    const PREVENTED: Self = Self {
        handled: true,
        prevent_default: true,
    };
}

impl Kernel {
    /// Processes one DOM event.
    ///
    /// Ignored once the kernel is destroyed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use layerkit::builders::DialogOptions;
    /// use layerkit::{Config, Document, DomEvent, Kernel, PlatformCapabilities};
    ///
    /// let mut kernel = Kernel::new(Config::default(), PlatformCapabilities::browser(), Document::new());
    /// kernel.open_dialog(DialogOptions::new().message("Hi"))?;
    ///
    /// let outcome = kernel.handle_event(&DomEvent::key("Escape"));
    /// assert!(outcome.prevent_default);
    /// assert!(!kernel.has_active_layer());
    /// # Ok::<(), layerkit::LayerkitError>(())
    /// ```
    pub fn handle_event(&mut self, event: &DomEvent) -> EventOutcome {
        if self.lifecycle == Lifecycle::Destroyed {
            return EventOutcome::IGNORED;
        }
        let _span = tracing::debug_span!("handle_event", ?event).entered();

        match event {
            DomEvent::KeyDown { key, shift } => self.on_key(key, *shift),
            DomEvent::Click { target } => self.on_click(*target),
            DomEvent::DocumentReady => {
                if self.lifecycle != Lifecycle::Pending {
                    return EventOutcome::IGNORED;
                }
                self.try_init();
                if self.lifecycle == Lifecycle::Ready {
                    EventOutcome::HANDLED
                } else {
                    EventOutcome::IGNORED
                }
            }
        }
    }

    fn on_key(&mut self, key: &str, shift: bool) -> EventOutcome {
        if key == "Tab" {
            return match self.layers.handle_tab(&mut self.svc, shift) {
                TabOutcome::Intercepted => EventOutcome::PREVENTED,
                TabOutcome::PassThrough => EventOutcome::IGNORED,
            };
        }

        if self.config.close_on_escape && key == self.config.shortcuts.close_key {
            if self.layers.has_active_layer() {
                tracing::debug!(key, "close key pressed");
                self.close_layer();
                return EventOutcome::PREVENTED;
            }
        }

        if self.config.shortcuts.dismiss_toasts_key.as_deref() == Some(key)
            && self.toasts.visible_count() + self.toasts.queued_count() > 0
        {
            self.toasts.clear_all(&mut self.svc);
            return EventOutcome::HANDLED;
        }

        EventOutcome::IGNORED
    }

    fn on_click(&mut self, target: NodeId) -> EventOutcome {
        if !self.svc.doc.contains_node(target) {
            tracing::debug!(node = ?target, "click on unknown node ignored");
            return EventOutcome::IGNORED;
        }
        if let Some((id, outcome)) = self.confirms.classify_click(&self.svc.doc, target) {
            if let Some(root) = self.confirms.settle(id, outcome) {
                self.close_surface(root);
            }
            return EventOutcome::HANDLED;
        }

        let in_layer_close = self
            .layers
            .active()
            .is_some_and(|layer| is_close_control(&self.svc.doc, layer.element, target));
        if in_layer_close {
            self.close_layer();
            return EventOutcome::HANDLED;
        }

        if self.config.close_on_overlay_click && self.svc.overlay.take_dismiss(target) {
            tracing::debug!("backdrop clicked");
            self.close_layer();
            return EventOutcome::HANDLED;
        }

        EventOutcome::IGNORED
    }
}

/// Whether `target` or one of its ancestors up to `layer` is a close control.
fn is_close_control(doc: &Document, layer: NodeId, target: NodeId) -> bool {
    if !doc.contains(layer, target) {
        return false;
    }
    let mut node = Some(target);
    while let Some(current) = node {
        if doc.attribute(current, ACTION_ATTRIBUTE) == Some("close") {
            return true;
        }
        if current == layer {
            break;
        }
        node = doc.parent(current);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{ConfirmOptions, DialogOptions};
    use crate::confirm::ConfirmOutcome;
    use crate::domain::toast::ToastKind;
    use crate::platform::capabilities::PlatformCapabilities;
    use crate::{Config, ConfigPatch};

    fn kernel() -> Kernel {
        Kernel::new(Config::default(), PlatformCapabilities::browser(), Document::new())
    }

    fn first_with_class(k: &Kernel, class: &str) -> NodeId {
        let root = k.document().root();
        k.document().query_class(root, class)[0]
    }

    #[test]
    fn close_button_click_closes_layer() {
        let mut k = kernel();
        k.open_dialog(DialogOptions::new().title("t")).unwrap();
        let button = first_with_class(&k, "layerkit-close");

        let outcome = k.handle_event(&DomEvent::click(button));
        assert!(outcome.handled);
        assert!(!k.has_active_layer());
    }

    #[test]
    fn clicks_inside_layer_do_not_dismiss() {
        let mut k = kernel();
        k.open_dialog(DialogOptions::new().title("t")).unwrap();
        let title = first_with_class(&k, "layerkit-title");

        assert_eq!(k.handle_event(&DomEvent::click(title)), EventOutcome::IGNORED);
        assert!(k.has_active_layer());
    }

    #[test]
    fn backdrop_click_respects_config() {
        let mut k = kernel();
        k.set_config(ConfigPatch {
            close_on_overlay_click: Some(false),
            ..ConfigPatch::default()
        });
        k.open_dialog(DialogOptions::new().title("t")).unwrap();
        let overlay = k.overlay().unwrap();
        k.handle_event(&DomEvent::click(overlay));
        assert!(k.has_active_layer());

        k.set_config(ConfigPatch {
            close_on_overlay_click: Some(true),
            ..ConfigPatch::default()
        });
        k.handle_event(&DomEvent::click(overlay));
        assert!(!k.has_active_layer());
    }

    #[test]
    fn close_key_closes_loader() {
        let mut k = kernel();
        k.set_loader(true, None).unwrap();

        assert!(k.handle_event(&DomEvent::key("Escape")).prevent_default);
        assert!(!k.has_active_layer());
        assert!(k.get_state().active_layer.is_none());
    }

    #[test]
    fn backdrop_click_closes_loader() {
        let mut k = kernel();
        k.set_loader(true, Some("Saving")).unwrap();
        let overlay = k.overlay().unwrap();

        assert!(k.handle_event(&DomEvent::click(overlay)).handled);
        assert!(!k.has_active_layer());
    }

    #[test]
    fn loader_stays_when_dismissal_is_disabled() {
        let mut k = kernel();
        k.set_config(ConfigPatch::from_json(r#"{"closeOnEscape": false, "closeOnOverlayClick": false}"#).unwrap());
        k.set_loader(true, None).unwrap();
        let overlay = k.overlay().unwrap();

        assert_eq!(k.handle_event(&DomEvent::key("Escape")), EventOutcome::IGNORED);
        assert_eq!(k.handle_event(&DomEvent::click(overlay)), EventOutcome::IGNORED);
        assert!(k.has_active_layer());
    }

    #[test]
    fn click_on_foreign_node_is_ignored() {
        let mut k = kernel();
        k.open_dialog(DialogOptions::new().title("t")).unwrap();
        let mut other = Document::new();
        let foreign = (0..50).map(|_| other.create_element("div")).last().unwrap();

        assert_eq!(k.handle_event(&DomEvent::click(foreign)), EventOutcome::IGNORED);
        assert!(k.has_active_layer());
        assert!(k.errors().is_empty());
    }

    #[test]
    fn confirm_controls_settle_and_close() {
        let mut k = kernel();
        let handle = k.confirm(ConfirmOptions::new("Delete?")).unwrap();
        let confirm = first_with_class(&k, "is-primary");

        k.handle_event(&DomEvent::click(confirm));
        assert_eq!(handle.outcome(), Some(ConfirmOutcome::Confirmed));
        assert!(!k.has_active_layer());
        assert_eq!(k.pending_confirms(), 0);
    }

    #[test]
    fn escape_declines_pending_confirm() {
        let mut k = kernel();
        let handle = k.confirm(ConfirmOptions::new("Delete?")).unwrap();
        k.handle_event(&DomEvent::key("Escape"));
        assert_eq!(handle.outcome(), Some(ConfirmOutcome::Declined));
    }

    #[test]
    fn dismiss_toasts_key_clears_toasts() {
        let mut k = kernel();
        k.set_config(ConfigPatch::from_json(r#"{"shortcuts": {"dismissToastsKey": "x"}}"#).unwrap());
        k.show_toast("a", ToastKind::Info, None);

        assert!(k.handle_event(&DomEvent::key("x")).handled);
        assert!(k.visible_toasts().is_empty());
        assert_eq!(k.handle_event(&DomEvent::key("x")), EventOutcome::IGNORED);
    }

    #[test]
    fn tab_without_layer_passes_through() {
        let mut k = kernel();
        assert_eq!(k.handle_event(&DomEvent::tab(false)), EventOutcome::IGNORED);
    }

    #[test]
    fn document_ready_completes_deferred_init() {
        let mut k = Kernel::new(Config::default(), PlatformCapabilities::browser(), Document::loading());
        assert_eq!(k.lifecycle(), Lifecycle::Pending);
        assert_eq!(k.handle_event(&DomEvent::DocumentReady), EventOutcome::IGNORED);

        k.document_mut().attach_body();
        assert!(k.handle_event(&DomEvent::DocumentReady).handled);
        assert_eq!(k.lifecycle(), Lifecycle::Ready);
        assert!(k.overlay().is_some());
    }
}

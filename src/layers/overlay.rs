//! Shared backdrop and page scroll lock.
//!
//! One [`OverlayManager`] exists per kernel. It lazily creates a single
//! backdrop element under `<body>`, every open layer is mounted inside it, and
//! it is the only element whose click can trigger overlay dismissal.
//!
//! # Invariants
//!
//! - At most one backdrop element is ever created per manager lifetime
//!   (until [`OverlayManager::destroy`]).
//! - The body carries [`NO_SCROLL_CLASS`] exactly while the overlay is shown.
//! - The dismiss listener is armed only between a `show(.., true)` and the
//!   next `hide()`, and fires at most once.

use crate::domain::error::Result;
use crate::platform::dom::{Document, NodeId};

pub const OVERLAY_CLASS: &str = "layerkit-overlay";
pub const VISIBLE_CLASS: &str = "is-visible";
pub const NO_SCROLL_CLASS: &str = "layerkit-no-scroll";

#[derive(Debug, Default)]
pub struct OverlayManager {
    element: Option<NodeId>,
    visible: bool,
    dismiss_armed: bool,
}

impl OverlayManager {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            element: None,
            visible: false,
            dismiss_armed: false,
        }
    }

    /// Returns the backdrop element, creating and mounting it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LayerkitError::Precondition`] when the document has
    /// no body yet.
    pub fn create(&mut self, doc: &mut Document) -> Result<NodeId> {
        if let Some(element) = self.element {
            return Ok(element);
        }
        let body = doc.require_body("overlay")?;
        let element = doc.create_element("div");
        doc.add_class(element, OVERLAY_CLASS);
        doc.set_attribute(element, "aria-hidden", "true");
        doc.append_child(body, element)?;
        self.element = Some(element);
        tracing::debug!(element = element.index(), "overlay created");
        Ok(element)
    }

    #[must_use]
    pub const fn element(&self) -> Option<NodeId> {
        self.element
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub const fn is_dismiss_armed(&self) -> bool {
        self.dismiss_armed
    }

    /// Shows the backdrop and locks page scroll.
    ///
    /// # Errors
    ///
    /// Propagates [`OverlayManager::create`] failures.
    pub fn show(&mut self, doc: &mut Document, arm_dismiss: bool) -> Result<()> {
        let element = self.create(doc)?;
        doc.add_class(element, VISIBLE_CLASS);
        doc.set_attribute(element, "aria-hidden", "false");
        if let Some(body) = doc.body() {
            doc.add_class(body, NO_SCROLL_CLASS);
        }
        self.visible = true;
        self.dismiss_armed = arm_dismiss;
        Ok(())
    }

    /// Hides the backdrop, unlocks scroll and disarms the dismiss listener.
    pub fn hide(&mut self, doc: &mut Document) {
        self.dismiss_armed = false;
        self.visible = false;
        if let Some(element) = self.element {
            doc.remove_class(element, VISIBLE_CLASS);
            doc.set_attribute(element, "aria-hidden", "true");
        }
        if let Some(body) = doc.body() {
            doc.remove_class(body, NO_SCROLL_CLASS);
        }
    }

    /// Consumes the armed dismiss listener if `target` is the backdrop itself.
    ///
    /// Clicks landing on a layer mounted inside the backdrop do not count.
    pub fn take_dismiss(&mut self, target: NodeId) -> bool {
        if self.dismiss_armed && self.element == Some(target) {
            self.dismiss_armed = false;
            return true;
        }
        false
    }

    /// Removes the backdrop and the scroll lock. Safe to call repeatedly.
    pub fn destroy(&mut self, doc: &mut Document) {
        self.dismiss_armed = false;
        self.visible = false;
        if let Some(element) = self.element.take() {
            doc.remove(element);
            tracing::debug!(element = element.index(), "overlay destroyed");
        }
        if let Some(body) = doc.body() {
            doc.remove_class(body, NO_SCROLL_CLASS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::LayerkitError;

    #[test]
    fn create_is_idempotent() {
        let mut doc = Document::new();
        let mut overlay = OverlayManager::new();
        let first = overlay.create(&mut doc).unwrap();
        let second = overlay.create(&mut doc).unwrap();
        assert_eq!(first, second);
        assert_eq!(doc.query_class(doc.root(), OVERLAY_CLASS).len(), 1);
    }

    #[test]
    fn create_without_body_is_a_precondition_failure() {
        let mut doc = Document::loading();
        let mut overlay = OverlayManager::new();
        let err = overlay.create(&mut doc).unwrap_err();
        assert!(matches!(err, LayerkitError::Precondition(_)));
        assert!(overlay.element().is_none());
    }

    #[test]
    fn show_and_hide_toggle_scroll_lock() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let mut overlay = OverlayManager::new();

        overlay.show(&mut doc, false).unwrap();
        let element = overlay.element().unwrap();
        assert!(doc.has_class(element, VISIBLE_CLASS));
        assert!(doc.has_class(body, NO_SCROLL_CLASS));
        assert_eq!(doc.attribute(element, "aria-hidden"), Some("false"));

        overlay.hide(&mut doc);
        assert!(!doc.has_class(element, VISIBLE_CLASS));
        assert!(!doc.has_class(body, NO_SCROLL_CLASS));
        assert!(!overlay.is_visible());
    }

    #[test]
    fn dismiss_fires_once_and_only_for_backdrop() {
        let mut doc = Document::new();
        let mut overlay = OverlayManager::new();
        overlay.show(&mut doc, true).unwrap();
        let element = overlay.element().unwrap();

        let inner = doc.create_element("div");
        doc.append_child(element, inner).unwrap();
        assert!(!overlay.take_dismiss(inner));
        assert!(overlay.take_dismiss(element));
        assert!(!overlay.take_dismiss(element));
    }

    #[test]
    fn hide_disarms_dismiss() {
        let mut doc = Document::new();
        let mut overlay = OverlayManager::new();
        overlay.show(&mut doc, true).unwrap();
        let element = overlay.element().unwrap();
        overlay.hide(&mut doc);
        assert!(!overlay.take_dismiss(element));
    }

    #[test]
    fn destroy_cleans_up_even_if_never_shown() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        doc.add_class(body, NO_SCROLL_CLASS);

        let mut overlay = OverlayManager::new();
        overlay.destroy(&mut doc);
        assert!(!doc.has_class(body, NO_SCROLL_CLASS));

        overlay.show(&mut doc, true).unwrap();
        let element = overlay.element().unwrap();
        overlay.destroy(&mut doc);
        overlay.destroy(&mut doc);
        assert!(!doc.is_attached(element));
        assert!(overlay.element().is_none());
    }
}

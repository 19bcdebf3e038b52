//! Tab-key focus trap for an open layer.
//!
//! The trap remembers what had focus before activation, moves focus inside
//! the container, cycles Tab/Shift+Tab at the edges, and on deactivation
//! hands focus back if the remembered element is still attached and not
//! disabled. It need not be tabbable, so a `tabindex="-1"` trigger focused
//! from script gets focus back too. Focus failures are logged and swallowed
//! throughout.

use super::cache::FocusableElementCache;
use crate::platform::dom::{Document, NodeId};

/// Whether a Tab press was handled by the trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabOutcome {
    /// Focus was moved by the trap; the default action must be prevented.
    Intercepted,
    /// Native focus traversal should proceed.
    PassThrough,
}

#[derive(Debug)]
pub struct FocusTrap {
    container: NodeId,
    previous: Option<NodeId>,
}

impl FocusTrap {
    /// Activates a trap on `container`, focusing its first focusable element.
    pub fn activate(doc: &mut Document, cache: &mut FocusableElementCache, container: NodeId) -> Self {
        let previous = doc.active_element();
        let focusables = cache.get(doc, container);
        if let Some(first) = focusables.first() {
            if let Err(e) = doc.focus(*first) {
                tracing::debug!(error = %e, "initial focus failed");
            }
        }
        tracing::debug!(
            container = container.index(),
            focusable_count = focusables.len(),
            restore_to = ?previous.map(NodeId::index),
            "focus trap activated"
        );
        Self { container, previous }
    }

    #[must_use]
    pub const fn container(&self) -> NodeId {
        self.container
    }

    #[must_use]
    pub const fn previous(&self) -> Option<NodeId> {
        self.previous
    }

    /// Handles a Tab (or Shift+Tab) press.
    pub fn handle_tab(&self, doc: &mut Document, cache: &mut FocusableElementCache, shift: bool) -> TabOutcome {
        let focusables = cache.get(doc, self.container);
        let (Some(&first), Some(&last)) = (focusables.first(), focusables.last()) else {
            return TabOutcome::PassThrough;
        };

        let active = doc.active_element();
        let inside = active.is_some_and(|a| focusables.contains(&a));
        let target = match (shift, active) {
            (_, _) if !inside => Some(if shift { last } else { first }),
            (false, Some(a)) if a == last => Some(first),
            (true, Some(a)) if a == first => Some(last),
            _ => None,
        };

        match target {
            Some(node) => {
                if let Err(e) = doc.focus(node) {
                    tracing::debug!(error = %e, "focus wrap failed");
                }
                TabOutcome::Intercepted
            }
            None => TabOutcome::PassThrough,
        }
    }

    /// Releases the trap and restores the previously focused element when it
    /// is still attached and not disabled.
    pub fn deactivate(self, doc: &mut Document, cache: &mut FocusableElementCache) {
        cache.unobserve(doc, self.container);
        let Some(previous) = self.previous else {
            return;
        };
        if !doc.is_attached(previous) || doc.has_attribute(previous, "disabled") {
            tracing::debug!(element = previous.index(), "previous focus target gone, not restoring");
            return;
        }
        if let Err(e) = doc.focus(previous) {
            tracing::debug!(error = %e, "focus restoration failed");
        }
    }
}

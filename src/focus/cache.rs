//! Per-container cache of focusable descendants.
//!
//! Entries live in an explicit map keyed by container [`NodeId`]. Nothing is
//! evicted implicitly: every path that stops using a container must call
//! [`FocusableElementCache::unobserve`], and teardown calls
//! [`FocusableElementCache::clear`].
//!
//! With mutation observation available, a cached list is reused until a
//! mutation record shows up for the container's subtree. Without it, every
//! query rescans.

use crate::platform::capabilities::MutationObservation;
use crate::platform::dom::{Document, NodeId};
use std::collections::HashMap;

/// Attributes whose changes can alter focusability.
pub const OBSERVED_ATTRIBUTES: &[&str] = &[
    "disabled",
    "tabindex",
    "href",
    "aria-hidden",
    "contenteditable",
    "type",
];

/// Whether `node` matches the focusable selector set.
///
/// Matches links and areas with `href`, enabled form controls (hidden inputs
/// excluded), non-negative `tabindex`, and, when `include_content_editable`
/// is set, editable hosts. Anything with `aria-hidden="true"` or `disabled`
/// never matches.
#[must_use]
pub fn is_focusable(doc: &Document, node: NodeId, include_content_editable: bool) -> bool {
    if doc.attribute(node, "aria-hidden") == Some("true") || doc.has_attribute(node, "disabled") {
        return false;
    }
    if let Some(tabindex) = doc.attribute(node, "tabindex") {
        return tabindex.trim().parse::<i32>().map_or(false, |t| t >= 0);
    }
    let native = match doc.tag(node) {
        "a" | "area" => doc.has_attribute(node, "href"),
        "button" | "select" | "textarea" => true,
        "input" => doc.attribute(node, "type") != Some("hidden"),
        _ => false,
    };
    native
        || (include_content_editable
            && doc
                .attribute(node, "contenteditable")
                .is_some_and(|v| v.is_empty() || v == "true" || v == "plaintext-only"))
}

#[derive(Debug)]
pub struct FocusableElementCache {
    entries: HashMap<NodeId, Vec<NodeId>>,
    observation: MutationObservation,
    include_content_editable: bool,
}

impl FocusableElementCache {
    #[must_use]
    pub fn new(observation: MutationObservation, include_content_editable: bool) -> Self {
        Self {
            entries: HashMap::new(),
            observation,
            include_content_editable,
        }
    }

    /// Focusable descendants of `container`, in document order.
    pub fn get(&mut self, doc: &mut Document, container: NodeId) -> Vec<NodeId> {
        if self.observation == MutationObservation::Unavailable {
            return self.scan(doc, container);
        }

        if !doc.take_records(container).is_empty() && self.entries.remove(&container).is_some() {
            tracing::trace!(container = container.index(), "focusable cache invalidated");
        }

        if let Some(cached) = self.entries.get(&container) {
            return cached.clone();
        }

        let found = self.scan(doc, container);
        doc.observe(container, OBSERVED_ATTRIBUTES);
        self.entries.insert(container, found.clone());
        found
    }

    fn scan(&self, doc: &Document, container: NodeId) -> Vec<NodeId> {
        doc.descendants(container)
            .into_iter()
            .filter(|n| is_focusable(doc, *n, self.include_content_editable))
            .collect()
    }

    /// Stops observing `container` and drops its entry.
    pub fn unobserve(&mut self, doc: &mut Document, container: NodeId) {
        doc.unobserve(container);
        self.entries.remove(&container);
    }

    /// Disconnects every observer and drops every entry.
    pub fn clear(&mut self, doc: &mut Document) {
        for container in self.entries.keys() {
            doc.unobserve(*container);
        }
        self.entries.clear();
    }

    #[must_use]
    pub fn is_cached(&self, container: NodeId) -> bool {
        self.entries.contains_key(&container)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_include_content_editable(&mut self, include: bool) {
        if self.include_content_editable != include {
            self.include_content_editable = include;
            self.entries.clear();
        }
    }
}

//! In-memory document model.
//!
//! [`Document`] is an arena of elements standing in for the page DOM: a tree
//! rooted at a document element with an optional `<body>`, per-element tag,
//! attributes, classes and text, a single focused element, and mutation
//! observation scoped to containers.
//!
//! Nodes are never freed. Removing a node detaches its subtree, which stays
//! addressable by [`NodeId`] (the way a detached DOM node stays reachable
//! from script) but reports `is_attached() == false`.
//!
//! # Mutation records
//!
//! An observed container accumulates [`MutationRecord`]s for child-list
//! changes and filtered attribute changes anywhere in its subtree. Records are
//! drained with [`Document::take_records`]; consumers decide when to look,
//! which mirrors an observer callback that runs after the triggering change.

use crate::domain::error::{LayerkitError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Handle to an element in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// What changed in an observed subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// Children were appended to or removed from `target`.
    ChildList,
    /// The named attribute of `target` changed.
    Attribute(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            classes: BTreeSet::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Observer {
    attribute_filter: Vec<String>,
    records: Vec<MutationRecord>,
}

/// Arena-backed page document.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Element>,
    root: NodeId,
    body: Option<NodeId>,
    active: Option<NodeId>,
    observers: HashMap<NodeId, Observer>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A ready document with an attached `<body>`.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self::loading();
        doc.attach_body();
        doc
    }

    /// A document that has not parsed its body yet.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            nodes: vec![Element::new("html")],
            root: NodeId(0),
            body: None,
            active: None,
            observers: HashMap::new(),
        }
    }

    /// Creates and attaches the `<body>` element if missing.
    pub fn attach_body(&mut self) -> NodeId {
        if let Some(body) = self.body {
            return body;
        }
        let body = self.alloc("body");
        self.link(self.root, body);
        self.body = Some(body);
        body
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub const fn body(&self) -> Option<NodeId> {
        self.body
    }

    /// Returns the body or a precondition error naming `purpose`.
    pub fn require_body(&self, purpose: &str) -> Result<NodeId> {
        self.body.ok_or_else(|| {
            LayerkitError::Precondition(format!("document has no body ({purpose})"))
        })
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(tag)
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Element::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    fn node(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }

    #[must_use]
    pub fn contains_node(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    #[must_use]
    pub fn tag(&self, id: NodeId) -> &str {
        &self.node(id).tag
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Whether `node` is `ancestor` or one of its descendants. `false` for
    /// ids this document never allocated.
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(current.0).and_then(|element| element.parent);
        }
        false
    }

    /// Whether `node` is connected to the document root.
    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    /// Descendants of `node` in document (pre-)order, excluding `node`.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(node).children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.node(current).children.iter().rev().copied());
        }
        out
    }

    /// Appends `child` to `parent`, moving it out of any previous parent.
    ///
    /// # Errors
    ///
    /// Returns [`LayerkitError::Dom`] if either id is unknown to this
    /// document, if `child` is `parent` or one of its ancestors, or if `child`
    /// is the document root.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        for id in [parent, child] {
            if !self.contains_node(id) {
                return Err(LayerkitError::Dom(format!("unknown node {}", id.0)));
            }
        }
        if child == self.root || self.contains(child, parent) {
            return Err(LayerkitError::Dom(format!(
                "cannot append node {} under {}",
                child.0, parent.0
            )));
        }
        if self.node(child).parent.is_some() {
            self.remove(child);
        }
        self.link(parent, child);
        self.record(parent, MutationKind::ChildList);
        Ok(())
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Detaches `node` from its parent. No-op for detached nodes.
    ///
    /// Focus inside the removed subtree is dropped back to the body.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).parent else {
            return;
        };
        if self.active.is_some_and(|active| self.contains(node, active)) {
            self.active = None;
        }
        self.node_mut(parent).children.retain(|c| *c != node);
        self.node_mut(node).parent = None;
        self.record(parent, MutationKind::ChildList);
    }

    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node).attributes.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.node(node).attributes.contains_key(name)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let previous = self.node_mut(node).attributes.insert(name.to_string(), value.clone());
        if previous.as_deref() != Some(value.as_str()) {
            self.record(node, MutationKind::Attribute(name.to_string()));
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if self.node_mut(node).attributes.remove(name).is_some() {
            self.record(node, MutationKind::Attribute(name.to_string()));
        }
    }

    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node).classes.contains(class)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if self.node_mut(node).classes.insert(class.to_string()) {
            self.record(node, MutationKind::Attribute("class".to_string()));
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if self.node_mut(node).classes.remove(class) {
            self.record(node, MutationKind::Attribute("class".to_string()));
        }
    }

    /// Sets the element's own text. Text is stored verbatim and never parsed.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        self.node_mut(node).text = text.into();
    }

    #[must_use]
    pub fn text(&self, node: NodeId) -> &str {
        &self.node(node).text
    }

    /// Concatenated text of `node` and its descendants.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        std::iter::once(node)
            .chain(self.descendants(node))
            .map(|n| self.node(n).text.as_str())
            .collect()
    }

    /// Attached elements under `scope` carrying `class`, in document order.
    #[must_use]
    pub fn query_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| self.has_class(*n, class))
            .collect()
    }

    /// The focused element, `None` meaning the body has focus.
    #[must_use]
    pub const fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    /// Moves focus to `node`.
    ///
    /// # Errors
    ///
    /// Returns [`LayerkitError::Dom`] if `node` is not attached.
    pub fn focus(&mut self, node: NodeId) -> Result<()> {
        if !self.is_attached(node) {
            return Err(LayerkitError::Dom(format!("node {} is not attached", node.0)));
        }
        self.active = Some(node);
        Ok(())
    }

    pub fn blur(&mut self) {
        self.active = None;
    }

    /// Starts recording mutations under `container`.
    ///
    /// Child-list changes are always recorded; attribute changes only for
    /// names in `attribute_filter`. Re-observing replaces the filter and
    /// keeps pending records.
    pub fn observe(&mut self, container: NodeId, attribute_filter: &[&str]) {
        let observer = self.observers.entry(container).or_default();
        observer.attribute_filter = attribute_filter.iter().map(|s| (*s).to_string()).collect();
    }

    /// Stops recording for `container` and drops its pending records.
    pub fn unobserve(&mut self, container: NodeId) {
        self.observers.remove(&container);
    }

    #[must_use]
    pub fn is_observed(&self, container: NodeId) -> bool {
        self.observers.contains_key(&container)
    }

    #[must_use]
    pub fn observed_count(&self) -> usize {
        self.observers.len()
    }

    /// Drains pending records for `container`.
    pub fn take_records(&mut self, container: NodeId) -> Vec<MutationRecord> {
        self.observers
            .get_mut(&container)
            .map(|o| std::mem::take(&mut o.records))
            .unwrap_or_default()
    }

    fn record(&mut self, target: NodeId, kind: MutationKind) {
        if self.observers.is_empty() {
            return;
        }
        let containers: Vec<NodeId> = self
            .observers
            .keys()
            .copied()
            .filter(|c| self.contains(*c, target))
            .collect();
        for container in containers {
            if let Some(observer) = self.observers.get_mut(&container) {
                let relevant = match &kind {
                    MutationKind::ChildList => true,
                    MutationKind::Attribute(name) => observer.attribute_filter.iter().any(|f| f == name),
                };
                if relevant {
                    observer.records.push(MutationRecord { target, kind: kind.clone() });
                }
            }
        }
    }
}

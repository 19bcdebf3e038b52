//! Surface construction boundary.
//!
//! The coordination core never builds markup itself. It asks a
//! [`SurfaceBuilder`] for a ready-to-mount subtree and only appends, removes
//! and scans what comes back. [`DefaultBuilder`] produces plain accessible
//! structures; hosts with their own component library plug in their own
//! builder through [`Kernel::with_builder`](crate::Kernel::with_builder).
//!
//! All caller strings are written as text content, never parsed as markup.

use crate::domain::error::{LayerkitError, Result};
use crate::domain::layer::{BoxError, LayerCallback, LayerKind, LayerMeta, LayerSnapshot};
use crate::domain::toast::{ToastEntry, ToastKind};
use crate::platform::dom::{Document, NodeId};
use serde::{Deserialize, Serialize};

/// Attribute marking controls the kernel reacts to on click.
pub const ACTION_ATTRIBUTE: &str = "data-action";

/// Caller options for a dialog (and, wrapped in [`SheetOptions`], a sheet).
pub struct DialogOptions {
    pub title: Option<String>,
    pub message: Option<String>,
    /// Caller-built subtree mounted as the dialog body.
    pub content: Option<NodeId>,
    /// Whether to render a close control. Default: `true`.
    pub close_button: bool,
    pub data: serde_json::Value,
    pub on_open: Option<LayerCallback>,
    pub on_close: Option<LayerCallback>,
}

impl Default for DialogOptions {
    fn default() -> Self {
        Self {
            title: None,
            message: None,
            content: None,
            close_button: true,
            data: serde_json::Value::Null,
            on_open: None,
            on_close: None,
        }
    }
}

impl std::fmt::Debug for DialogOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogOptions")
            .field("title", &self.title)
            .field("message", &self.message)
            .field("content", &self.content)
            .field("close_button", &self.close_button)
            .field("data", &self.data)
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

impl DialogOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub const fn content(mut self, content: NodeId) -> Self {
        self.content = Some(content);
        self
    }

    #[must_use]
    pub const fn close_button(mut self, show: bool) -> Self {
        self.close_button = show;
        self
    }

    #[must_use]
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn on_open<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&LayerSnapshot) -> std::result::Result<(), BoxError> + 'static,
    {
        self.on_open = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_close<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&LayerSnapshot) -> std::result::Result<(), BoxError> + 'static,
    {
        self.on_close = Some(Box::new(callback));
        self
    }

    /// Moves the payload and callbacks into layer metadata.
    #[must_use]
    pub fn into_meta(self, kind: LayerKind) -> LayerMeta {
        LayerMeta {
            kind,
            on_open: self.on_open,
            on_close: self.on_close,
            data: self.data,
        }
    }

    fn is_blank(&self) -> bool {
        self.title.is_none() && self.message.is_none() && self.content.is_none()
    }
}

/// Edge a sheet slides in from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetSide {
    Top,
    #[default]
    Right,
    Bottom,
    Left,
}

impl SheetSide {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        }
    }
}

#[derive(Debug, Default)]
pub struct SheetOptions {
    pub side: SheetSide,
    pub surface: DialogOptions,
}

impl SheetOptions {
    #[must_use]
    pub const fn new(side: SheetSide, surface: DialogOptions) -> Self {
        Self { side, surface }
    }
}

/// Caller options for a yes/no confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfirmOptions {
    pub title: Option<String>,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        Self {
            title: None,
            message: String::new(),
            confirm_label: "Confirm".to_string(),
            cancel_label: "Cancel".to_string(),
        }
    }
}

impl ConfirmOptions {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn labels(mut self, confirm: impl Into<String>, cancel: impl Into<String>) -> Self {
        self.confirm_label = confirm.into();
        self.cancel_label = cancel.into();
        self
    }
}

/// Elements of a built confirmation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmParts {
    pub root: NodeId,
    pub confirm_button: NodeId,
    pub cancel_button: NodeId,
}

/// Produces the subtree for each surface type.
///
/// Builders may fail; the kernel records the failure and applies its
/// safe-mode policy.
pub trait SurfaceBuilder {
    /// # Errors
    ///
    /// Implementations return [`LayerkitError::Build`] when the options
    /// cannot produce a surface.
    fn dialog(&self, doc: &mut Document, options: &DialogOptions) -> Result<NodeId>;

    /// # Errors
    ///
    /// See [`SurfaceBuilder::dialog`].
    fn sheet(&self, doc: &mut Document, options: &SheetOptions) -> Result<NodeId>;

    /// # Errors
    ///
    /// See [`SurfaceBuilder::dialog`].
    fn loader(&self, doc: &mut Document, text: Option<&str>) -> Result<NodeId>;

    /// # Errors
    ///
    /// See [`SurfaceBuilder::dialog`].
    fn toast(&self, doc: &mut Document, entry: &ToastEntry) -> Result<NodeId>;

    /// # Errors
    ///
    /// See [`SurfaceBuilder::dialog`].
    fn confirm(&self, doc: &mut Document, options: &ConfirmOptions) -> Result<ConfirmParts>;
}

/// Plain, accessible default surfaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBuilder;

impl DefaultBuilder {
    fn text_element(doc: &mut Document, parent: NodeId, tag: &str, class: &str, text: &str) -> Result<NodeId> {
        let node = doc.create_element(tag);
        doc.add_class(node, class);
        doc.set_text(node, text);
        doc.append_child(parent, node)?;
        Ok(node)
    }

    fn button(doc: &mut Document, parent: NodeId, action: &str, label: &str) -> Result<NodeId> {
        let button = Self::text_element(doc, parent, "button", "layerkit-button", label)?;
        doc.set_attribute(button, "type", "button");
        doc.set_attribute(button, ACTION_ATTRIBUTE, action);
        Ok(button)
    }

    fn surface(doc: &mut Document, class: &str, options: &DialogOptions) -> Result<NodeId> {
        if options.is_blank() {
            return Err(LayerkitError::Build(
                "a title, message or content node is required".to_string(),
            ));
        }
        let root = doc.create_element("div");
        doc.add_class(root, class);
        doc.set_attribute(root, "role", "dialog");
        doc.set_attribute(root, "aria-modal", "true");

        if let Some(title) = &options.title {
            Self::text_element(doc, root, "h2", "layerkit-title", title)?;
        }
        if let Some(message) = &options.message {
            Self::text_element(doc, root, "p", "layerkit-message", message)?;
        }
        if let Some(content) = options.content {
            let body = doc.create_element("div");
            doc.add_class(body, "layerkit-body");
            doc.append_child(root, body)?;
            doc.append_child(body, content)
                .map_err(|e| LayerkitError::Build(format!("content could not be mounted: {e}")))?;
        }
        if options.close_button {
            let close = Self::button(doc, root, "close", "Close")?;
            doc.add_class(close, "layerkit-close");
            doc.set_attribute(close, "aria-label", "Close");
        }
        Ok(root)
    }
}

impl SurfaceBuilder for DefaultBuilder {
    fn dialog(&self, doc: &mut Document, options: &DialogOptions) -> Result<NodeId> {
        Self::surface(doc, "layerkit-dialog", options)
    }

    fn sheet(&self, doc: &mut Document, options: &SheetOptions) -> Result<NodeId> {
        let root = Self::surface(doc, "layerkit-sheet", &options.surface)?;
        doc.set_attribute(root, "data-side", options.side.as_str());
        Ok(root)
    }

    fn loader(&self, doc: &mut Document, text: Option<&str>) -> Result<NodeId> {
        let root = doc.create_element("div");
        doc.add_class(root, "layerkit-loader");
        doc.set_attribute(root, "role", "progressbar");
        doc.set_attribute(root, "aria-busy", "true");
        doc.set_attribute(root, "aria-live", "polite");
        let spinner = doc.create_element("div");
        doc.add_class(spinner, "layerkit-spinner");
        doc.append_child(root, spinner)?;
        if let Some(text) = text {
            Self::text_element(doc, root, "p", "layerkit-message", text)?;
        }
        Ok(root)
    }

    fn toast(&self, doc: &mut Document, entry: &ToastEntry) -> Result<NodeId> {
        let node = doc.create_element("div");
        doc.add_class(node, "layerkit-toast");
        doc.add_class(node, &format!("toast-{}", entry.kind.as_str()));
        let urgent = matches!(entry.kind, ToastKind::Error | ToastKind::Warning);
        doc.set_attribute(node, "role", if urgent { "alert" } else { "status" });
        doc.set_attribute(node, "aria-live", if urgent { "assertive" } else { "polite" });
        doc.set_text(node, entry.message.as_str());
        Ok(node)
    }

    fn confirm(&self, doc: &mut Document, options: &ConfirmOptions) -> Result<ConfirmParts> {
        let surface = DialogOptions {
            title: options.title.clone(),
            message: Some(options.message.clone()),
            close_button: false,
            ..DialogOptions::default()
        };
        let root = Self::surface(doc, "layerkit-dialog", &surface)?;
        doc.add_class(root, "layerkit-confirm");
        doc.set_attribute(root, "role", "alertdialog");

        let actions = doc.create_element("div");
        doc.add_class(actions, "layerkit-actions");
        doc.append_child(root, actions)?;
        let cancel_button = Self::button(doc, actions, "cancel", &options.cancel_label)?;
        let confirm_button = Self::button(doc, actions, "confirm", &options.confirm_label)?;
        doc.add_class(confirm_button, "is-primary");

        Ok(ConfirmParts {
            root,
            confirm_button,
            cancel_button,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::toast::ToastId;

    #[test]
    fn dialog_requires_some_content() {
        let mut doc = Document::new();
        let err = DefaultBuilder.dialog(&mut doc, &DialogOptions::new()).unwrap_err();
        assert!(matches!(err, LayerkitError::Build(_)));
    }

    #[test]
    fn dialog_writes_text_and_close_control() {
        let mut doc = Document::new();
        let options = DialogOptions::new().title("Hello").message("<b>not markup</b>");
        let root = DefaultBuilder.dialog(&mut doc, &options).unwrap();

        assert_eq!(doc.attribute(root, "role"), Some("dialog"));
        assert_eq!(doc.text_content(root), "Hello<b>not markup</b>Close");
        let close = doc.query_class(root, "layerkit-close");
        assert_eq!(close.len(), 1);
        assert_eq!(doc.attribute(close[0], ACTION_ATTRIBUTE), Some("close"));
    }

    #[test]
    fn dialog_mounts_caller_content() {
        let mut doc = Document::new();
        let content = doc.create_element("form");
        let root = DefaultBuilder
            .dialog(&mut doc, &DialogOptions::new().content(content).close_button(false))
            .unwrap();
        assert!(doc.contains(root, content));
        assert!(doc.query_class(root, "layerkit-close").is_empty());
    }

    #[test]
    fn sheet_records_side() {
        let mut doc = Document::new();
        let options = SheetOptions::new(SheetSide::Left, DialogOptions::new().title("Filters"));
        let root = DefaultBuilder.sheet(&mut doc, &options).unwrap();
        assert!(doc.has_class(root, "layerkit-sheet"));
        assert_eq!(doc.attribute(root, "data-side"), Some("left"));
    }

    #[test]
    fn toast_role_follows_kind() {
        let mut doc = Document::new();
        let entry = ToastEntry::new(ToastId(1), "Saved", ToastKind::Success, 1000);
        let node = DefaultBuilder.toast(&mut doc, &entry).unwrap();
        assert_eq!(doc.attribute(node, "role"), Some("status"));
        assert!(doc.has_class(node, "toast-success"));

        let entry = ToastEntry::new(ToastId(2), "Failed", ToastKind::Error, 1000);
        let node = DefaultBuilder.toast(&mut doc, &entry).unwrap();
        assert_eq!(doc.attribute(node, "role"), Some("alert"));
        assert_eq!(doc.text(node), "Failed");
    }

    #[test]
    fn confirm_exposes_both_controls() {
        let mut doc = Document::new();
        let parts = DefaultBuilder
            .confirm(&mut doc, &ConfirmOptions::new("Delete?").labels("Delete", "Keep"))
            .unwrap();
        assert_eq!(doc.text(parts.confirm_button), "Delete");
        assert_eq!(doc.text(parts.cancel_button), "Keep");
        assert!(doc.contains(parts.root, parts.confirm_button));
        assert_eq!(doc.attribute(parts.root, "role"), Some("alertdialog"));
    }
}

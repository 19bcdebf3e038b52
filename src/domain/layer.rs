//! Layer domain model.
//!
//! A layer is the single modal-like surface (dialog, sheet or loader) the
//! coordinator may have open at any time. This module holds the identifiers,
//! the caller-facing metadata passed to `open`, the immutable snapshot that
//! flows through events and state, and the guarded callback runner shared by
//! every hook the runtime invokes.

use crate::domain::error::LayerkitError;
use crate::platform::dom::NodeId;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Boxed error type accepted from caller callbacks and listeners.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Caller callback invoked once when a layer opens or closes.
pub type LayerCallback = Box<dyn FnOnce(&LayerSnapshot) -> Result<(), BoxError>>;

/// Kind of surface occupying the layer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Dialog,
    Sheet,
    Loader,
}

impl LayerKind {
    /// Lowercase name used for event topics (`dialog:open`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dialog => "dialog",
            Self::Sheet => "sheet",
            Self::Loader => "loader",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of one `open()` call. Never reused within a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub(crate) u64);

impl LayerId {
    /// Raw numeric value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Point-in-time description of an open (or just closed) layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSnapshot {
    pub id: LayerId,
    pub kind: LayerKind,
    pub element: NodeId,
    /// Opaque caller payload, passed through unmodified.
    pub data: serde_json::Value,
}

/// Everything `LayerCoordinator::open` needs besides the element itself.
pub struct LayerMeta {
    pub kind: LayerKind,
    pub on_open: Option<LayerCallback>,
    pub on_close: Option<LayerCallback>,
    pub data: serde_json::Value,
}

impl LayerMeta {
    /// Metadata with no callbacks and a null payload.
    #[must_use]
    pub const fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            on_open: None,
            on_close: None,
            data: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn on_open<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&LayerSnapshot) -> Result<(), BoxError> + 'static,
    {
        self.on_open = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_close<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&LayerSnapshot) -> Result<(), BoxError> + 'static,
    {
        self.on_close = Some(Box::new(callback));
        self
    }
}

impl std::fmt::Debug for LayerMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerMeta")
            .field("kind", &self.kind)
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("data", &self.data)
            .finish()
    }
}

/// Runs a caller hook, converting both returned errors and panics into a
/// [`LayerkitError::Callback`].
///
/// The hook's own failure never escapes this function; the caller decides
/// whether to record the returned error.
pub(crate) fn run_guarded<T, F>(hook: &str, f: F) -> Result<(), LayerkitError>
where
    F: FnOnce() -> Result<T, BoxError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(LayerkitError::Callback {
            hook: hook.to_string(),
            message: e.to_string(),
        }),
        Err(payload) => Err(LayerkitError::Callback {
            hook: hook.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with non-string payload".to_string())
}

//! Layerkit: a single-active-layer overlay runtime.
//!
//! Layerkit centrally manages the transient surfaces of one page:
//! - Modal dialogs and slide-in sheets sharing one backdrop
//! - A loading indicator occupying the same layer slot
//! - Promise-style yes/no confirmations with external cancellation
//! - Toast notifications with a visible-count cap and FIFO overflow
//! - Focus trapping with restoration, kept consistent under DOM mutation
//! - An observable state store with idle-time batching and diff history
//!
//! # Architecture
//!
//! The crate follows a layered architecture pattern:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Kernel (kernel/)                                   │  ← Public surface
//! │  - Operation guard (safe mode)                      │
//! │  - DOM event handling (keys, clicks, readiness)     │
//! │  - Timer dispatch                                   │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Layers        │   │ Toasts        │   │ Confirm       │
//! │ (layers/)     │   │ (toast/)      │   │ (confirm/)    │
//! │ - Coordinator │   │ - Cap + FIFO  │   │ - Settle-once │
//! │ - Overlay     │   │ - Exit timers │   │ - Cancel token│
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                    │                    │
//! ┌─────────────────────────────────────────────────────┐
//! │  Focus (focus/), State (state/), Events (events/)   │
//! │  - Focus trap + focusable cache                     │
//! │  - Snapshots, patches, diffs, bounded history       │
//! │  - Typed event bus                                  │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Platform (platform/) & Domain (domain/)            │
//! │  - Document model, virtual timers, capabilities     │
//! │  - Error types, layer and toast models              │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`kernel`]: The orchestrator and its DOM event handler
//! - [`layers`]: Single-active-layer state machine and backdrop
//! - [`toast`]: Toast queue
//! - [`confirm`]: Confirmation futures
//! - [`focus`]: Focus trap and focusable-element cache
//! - [`state`]: State store, snapshots and history
//! - [`events`]: Event bus and runtime event vocabulary
//! - [`builders`]: Surface construction boundary
//! - [`platform`]: Document model, timers and capabilities
//! - [`domain`]: Core types and errors
//! - [`observability`]: Tracing setup and error reporting
//!
//! # Configuration
//!
//! Options use camelCase keys and can be loaded from TOML:
//!
//! ```toml
//! closeOnEscape = true
//! closeOnOverlayClick = false
//! maxToasts = 5
//! batchUpdates = true
//!
//! [shortcuts]
//! closeKey = "q"
//! ```
//!
//! and patched at runtime from JSON through [`ConfigPatch`].
//!
//! # Driving the runtime
//!
//! The host owns the event loop. It forwards DOM events through
//! [`Kernel::handle_event`], advances virtual time with [`Kernel::advance`],
//! and reports idle slots with [`Kernel::run_idle`]. Nothing runs on its own.
//!
//! # Example
//!
//! ```rust
//! use layerkit::builders::DialogOptions;
//! use layerkit::kernel::DomEvent;
//! use layerkit::platform::Document;
//! use layerkit::{Config, Kernel, PlatformCapabilities, ToastKind};
//!
//! let mut kernel = Kernel::new(Config::default(), PlatformCapabilities::browser(), Document::new());
//!
//! kernel
//!     .open_dialog(DialogOptions::new().title("Welcome"))?
//!     .show_toast("Saved", ToastKind::Success, None);
//! assert!(kernel.has_active_layer());
//!
//! kernel.handle_event(&DomEvent::key("Escape"));
//! assert!(!kernel.has_active_layer());
//!
//! kernel.advance(5_000);
//! assert!(kernel.get_state().toasts.is_empty());
//! # Ok::<(), layerkit::LayerkitError>(())
//! ```
//!
//! # Key Design Decisions
//!
//! ## Explicit capabilities
//!
//! Idle scheduling, mutation observation and cancellation are injected once
//! as [`PlatformCapabilities`]. Components degrade to their synchronous or
//! always-on fallback when a capability is absent instead of probing at call
//! sites.
//!
//! ## Virtual time
//!
//! Toast lifetimes and batched flushes run on a host-driven timer queue, so
//! every ordering guarantee is deterministic and testable.

#![allow(clippy::multiple_crate_versions)]

pub mod builders;
pub mod confirm;
pub mod domain;
pub mod events;
pub mod focus;
pub mod kernel;
pub mod layers;
pub mod observability;
pub mod platform;
pub mod state;
pub mod toast;

pub use confirm::{ConfirmHandle, ConfirmOutcome};
pub use domain::{ErrorKind, ErrorRecord, LayerKind, LayerSnapshot, LayerkitError, Result, ToastEntry, ToastKind};
pub use events::{EventTopic, RuntimeEvent};
pub use kernel::{DomEvent, EventOutcome, Kernel, Lifecycle};
pub use platform::{Document, PlatformCapabilities};
pub use state::{StateSnapshot, StoreOptions};

use layers::LayerSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Keyboard shortcuts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Shortcuts {
    /// Key that closes the active layer when `closeOnEscape` is set.
    /// Default: `"Escape"`
    pub close_key: String,

    /// Key that dismisses every toast. Disabled by default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismiss_toasts_key: Option<String>,
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            close_key: "Escape".to_string(),
            dismiss_toasts_key: None,
        }
    }
}

/// Runtime configuration.
///
/// # Example
///
/// ```rust
/// use layerkit::Config;
///
/// let config = Config::from_toml_str(r#"
///     maxToasts = 5
///
///     [shortcuts]
///     closeKey = "q"
/// "#)?;
///
/// assert_eq!(config.max_toasts, 5);
/// assert_eq!(config.shortcuts.close_key, "q");
/// assert!(config.close_on_escape);
/// # Ok::<(), layerkit::LayerkitError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Close key closes the active layer. Default: `true`
    pub close_on_escape: bool,

    /// Backdrop click closes the active layer. Default: `true`
    pub close_on_overlay_click: bool,

    /// Trap focus inside open layers. Default: `true`
    pub focus_trap: bool,

    /// Maximum simultaneously visible toasts; `0` means no cap. Default: `3`
    pub max_toasts: usize,

    /// Coalesce state updates until an idle slot. Default: `false`
    pub batch_updates: bool,

    /// History ring buffer capacity; `0` disables history. Default: `20`
    pub state_history_size: usize,

    /// Record per-key diffs instead of full snapshots. Default: `true`
    pub use_diff_history: bool,

    /// Swallow (`true`) or return (`false`) failures of public operations.
    /// Failures are recorded either way. Default: `true`
    pub safe_mode: bool,

    /// Default toast duration in milliseconds. Default: `3000`
    pub toast_duration: u64,

    /// Delay between a toast starting its exit and its removal, in
    /// milliseconds. Default: `200`
    pub toast_exit_delay: u64,

    /// Count `contenteditable` hosts as focusable. Default: `false`
    pub include_content_editable: bool,

    /// Tracing filter directive (`trace`, `debug`, `info`, ...).
    /// Default: `"info"` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_level: Option<String>,

    pub shortcuts: Shortcuts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            close_on_escape: true,
            close_on_overlay_click: true,
            focus_trap: true,
            max_toasts: toast::DEFAULT_MAX_TOASTS,
            batch_updates: false,
            state_history_size: state::history::DEFAULT_HISTORY_SIZE,
            use_diff_history: true,
            safe_mode: true,
            toast_duration: toast::DEFAULT_TOAST_DURATION_MS,
            toast_exit_delay: toast::DEFAULT_TOAST_EXIT_DELAY_MS,
            include_content_editable: false,
            trace_level: None,
            shortcuts: Shortcuts::default(),
        }
    }
}

impl Config {
    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LayerkitError::Config`] if the document is not valid TOML
    /// or a value has the wrong type.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| LayerkitError::Config(e.to_string()))
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`LayerkitError::Io`] if the file cannot be read and
    /// [`LayerkitError::Config`] if it cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&source)
    }

    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`LayerkitError::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| LayerkitError::Config(e.to_string()))
    }

    /// Merges `patch` over this configuration.
    ///
    /// Every key present in the patch replaces the current value, except
    /// `shortcuts`, which merges key by key.
    pub fn apply_patch(&mut self, patch: ConfigPatch) {
        let ConfigPatch {
            close_on_escape,
            close_on_overlay_click,
            focus_trap,
            max_toasts,
            batch_updates,
            state_history_size,
            use_diff_history,
            safe_mode,
            shortcuts,
            toast_duration,
            toast_exit_delay,
            include_content_editable,
            trace_level,
        } = patch;

        merge(&mut self.close_on_escape, close_on_escape);
        merge(&mut self.close_on_overlay_click, close_on_overlay_click);
        merge(&mut self.focus_trap, focus_trap);
        merge(&mut self.max_toasts, max_toasts);
        merge(&mut self.batch_updates, batch_updates);
        merge(&mut self.state_history_size, state_history_size);
        merge(&mut self.use_diff_history, use_diff_history);
        merge(&mut self.safe_mode, safe_mode);
        merge(&mut self.toast_duration, toast_duration);
        merge(&mut self.toast_exit_delay, toast_exit_delay);
        merge(&mut self.include_content_editable, include_content_editable);
        if trace_level.is_some() {
            self.trace_level = trace_level;
        }
        if let Some(shortcuts) = shortcuts {
            if let Some(close_key) = shortcuts.close_key {
                self.shortcuts.close_key = close_key;
            }
            if shortcuts.dismiss_toasts_key.is_some() {
                self.shortcuts.dismiss_toasts_key = shortcuts.dismiss_toasts_key;
            }
        }
    }

    /// Store behavior derived from this configuration.
    #[must_use]
    pub const fn store_options(&self) -> StoreOptions {
        StoreOptions {
            batch_updates: self.batch_updates,
            diff_history: self.use_diff_history,
            history_size: self.state_history_size,
        }
    }

    pub(crate) const fn layer_settings(&self) -> LayerSettings {
        LayerSettings {
            focus_trap: self.focus_trap,
            close_on_overlay_click: self.close_on_overlay_click,
        }
    }
}

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Partial shortcut update; absent keys are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ShortcutsPatch {
    pub close_key: Option<String>,
    pub dismiss_toasts_key: Option<String>,
}

/// Partial configuration update for [`Kernel::set_config`].
///
/// # Example
///
/// ```rust
/// use layerkit::{Config, ConfigPatch};
///
/// let mut config = Config::default();
/// config.apply_patch(ConfigPatch::from_json(r#"{"maxToasts": 1, "shortcuts": {"closeKey": "q"}}"#)?);
///
/// assert_eq!(config.max_toasts, 1);
/// assert_eq!(config.shortcuts.close_key, "q");
/// # Ok::<(), layerkit::LayerkitError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigPatch {
    pub close_on_escape: Option<bool>,
    pub close_on_overlay_click: Option<bool>,
    pub focus_trap: Option<bool>,
    pub max_toasts: Option<usize>,
    pub batch_updates: Option<bool>,
    pub state_history_size: Option<usize>,
    pub use_diff_history: Option<bool>,
    pub safe_mode: Option<bool>,
    pub shortcuts: Option<ShortcutsPatch>,
    pub toast_duration: Option<u64>,
    pub toast_exit_delay: Option<u64>,
    pub include_content_editable: Option<bool>,
    pub trace_level: Option<String>,
}

impl ConfigPatch {
    /// Parses a JSON object. Unknown keys are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`LayerkitError::Config`] for malformed JSON, unknown keys or
    /// mistyped values.
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| LayerkitError::Config(e.to_string()))
    }
}

/// Creates a kernel for `document` with browser capabilities.
///
/// Installs the tracing subscriber (see [`observability::init_tracing`]),
/// then builds the kernel. If the document has no body yet, initialization is
/// deferred until [`DomEvent::DocumentReady`] is handled.
///
/// # Example
///
/// ```rust
/// use layerkit::{initialize, Config, Document, Lifecycle};
///
/// let kernel = initialize(Config::default(), Document::new());
/// assert_eq!(kernel.lifecycle(), Lifecycle::Ready);
///
/// let deferred = initialize(Config::default(), Document::loading());
/// assert_eq!(deferred.lifecycle(), Lifecycle::Pending);
/// ```
pub fn initialize(config: Config, document: Document) -> Kernel {
    observability::init_tracing(&config);
    tracing::debug!("initializing layerkit kernel");
    Kernel::new(config, PlatformCapabilities::browser(), document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert!(config.close_on_escape);
        assert!(config.close_on_overlay_click);
        assert!(config.focus_trap);
        assert_eq!(config.max_toasts, 3);
        assert!(!config.batch_updates);
        assert_eq!(config.state_history_size, 20);
        assert!(config.use_diff_history);
        assert!(config.safe_mode);
        assert_eq!(config.shortcuts.close_key, "Escape");
        assert_eq!(config.toast_duration, 3000);
        assert_eq!(config.toast_exit_delay, 200);
    }

    #[test]
    fn patch_merges_shortcuts_key_by_key() {
        let mut config = Config::default();
        config.shortcuts.dismiss_toasts_key = Some("x".to_string());
        config.apply_patch(ConfigPatch {
            shortcuts: Some(ShortcutsPatch {
                close_key: Some("q".to_string()),
                dismiss_toasts_key: None,
            }),
            ..ConfigPatch::default()
        });
        assert_eq!(config.shortcuts.close_key, "q");
        assert_eq!(config.shortcuts.dismiss_toasts_key.as_deref(), Some("x"));
    }

    #[test]
    fn patch_leaves_absent_keys_untouched() {
        let mut config = Config::default();
        config.apply_patch(ConfigPatch::from_json(r#"{"closeOnEscape": false}"#).unwrap());
        assert!(!config.close_on_escape);
        assert_eq!(config.max_toasts, 3);
        assert!(config.safe_mode);
    }

    #[test]
    fn unknown_patch_keys_are_rejected() {
        let err = ConfigPatch::from_json(r#"{"closeOnEsc": false}"#).unwrap_err();
        assert!(matches!(err, LayerkitError::Config(_)));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = Config::default();
        config.max_toasts = 7;
        config.shortcuts.close_key = "q".to_string();
        let text = config.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn layer_settings_follow_config() {
        let mut config = Config::default();
        assert!(config.layer_settings().close_on_overlay_click);
        config.close_on_overlay_click = false;
        config.focus_trap = false;
        let settings = config.layer_settings();
        assert!(!settings.close_on_overlay_click);
        assert!(!settings.focus_trap);
    }
}

//! Error types for the layer runtime.
//!
//! This module defines the centralized error type [`LayerkitError`], the
//! [`Result`] alias used throughout the crate, and [`ErrorRecord`], the
//! inspectable record the kernel keeps for every failure it catches at a
//! boundary. All errors are implemented using the `thiserror` crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for layer runtime operations.
///
/// Variants are grouped the way failures are handled: precondition failures
/// are reported at the detecting call, callback failures never leave the
/// boundary that caught them, and everything else flows through the kernel's
/// safe-mode guard.
///
/// # Examples
///
/// ```
/// use layerkit::LayerkitError;
///
/// fn mount() -> Result<(), LayerkitError> {
///     Err(LayerkitError::Precondition("document has no body".to_string()))
/// }
///
/// assert!(mount().unwrap_err().is_precondition());
/// ```
#[derive(Debug, Error)]
pub enum LayerkitError {
    /// A required platform precondition is missing.
    ///
    /// Raised when the document is not ready (no body element) or a required
    /// container is missing. Kernel initialization retries automatically once
    /// the document reports readiness.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A surface builder could not produce an element.
    #[error("Build error: {0}")]
    Build(String),

    /// A caller-supplied callback failed or panicked.
    ///
    /// Only ever recorded; never propagated into the layer state machine.
    #[error("Callback '{hook}' failed: {message}")]
    Callback {
        /// Hook that failed (`on_open`, `on_close`, listener name, ...).
        hook: String,
        /// Failure description.
        message: String,
    },

    /// Configuration is invalid or could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The kernel was destroyed and no longer accepts mutating operations.
    #[error("Kernel has been destroyed")]
    Destroyed,

    /// A document operation referenced a node in an invalid state.
    #[error("DOM error: {0}")]
    Dom(String),

    /// State or history could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem or I/O operation failed (configuration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LayerkitError {
    /// Returns `true` for [`LayerkitError::Precondition`].
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Short stable identifier used in error records and events.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Precondition(_) => ErrorKind::Precondition,
            Self::Build(_) => ErrorKind::Build,
            Self::Callback { .. } => ErrorKind::Callback,
            Self::Config(_) | Self::Io(_) => ErrorKind::Config,
            Self::Destroyed => ErrorKind::Destroyed,
            Self::Dom(_) => ErrorKind::Dom,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

/// Category of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Precondition,
    Build,
    Callback,
    Config,
    Destroyed,
    Dom,
    Serialization,
}

/// A failure caught at a boundary and kept for inspection.
///
/// Records are appended to the kernel's error list, emitted as
/// [`RuntimeEvent::Error`](crate::events::RuntimeEvent::Error) and forwarded
/// to the configured [`ErrorReporter`](crate::observability::ErrorReporter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Operation or hook during which the failure happened.
    pub context: String,
    /// Failure category.
    pub kind: ErrorKind,
    /// Rendered error message.
    pub message: String,
    /// When the failure was recorded.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorRecord {
    /// Creates a record for `error` raised while running `context`.
    #[must_use]
    pub fn new(context: impl Into<String>, error: &LayerkitError) -> Self {
        Self {
            context: context.into(),
            kind: error.kind(),
            message: error.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// A specialized `Result` type for layer runtime operations.
pub type Result<T> = std::result::Result<T, LayerkitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_captures_kind_and_message() {
        let err = LayerkitError::Build("missing content".to_string());
        let record = ErrorRecord::new("open_dialog", &err);
        assert_eq!(record.kind, ErrorKind::Build);
        assert_eq!(record.context, "open_dialog");
        assert_eq!(record.message, "Build error: missing content");
    }

    #[test]
    fn callback_error_formats_hook() {
        let err = LayerkitError::Callback {
            hook: "on_close".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Callback 'on_close' failed: boom");
        assert_eq!(err.kind(), ErrorKind::Callback);
    }
}

//! Toast notification model.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Severity of a toast notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Error,
    Warning,
}

impl ToastKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }

    /// Parses a kind name, falling back to [`ToastKind::Info`] for anything
    /// outside the allowed set.
    ///
    /// # Example
    ///
    /// ```rust
    /// use layerkit::ToastKind;
    ///
    /// assert_eq!(ToastKind::from_name("error"), ToastKind::Error);
    /// assert_eq!(ToastKind::from_name("<script>"), ToastKind::Info);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::debug!(kind = %name, "unknown toast kind, using info");
            Self::Info
        })
    }
}

impl FromStr for ToastKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            other => Err(format!("unknown toast kind '{other}'")),
        }
    }
}

/// Identifier assigned to every `show` request, queued or displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToastId(pub(crate) u64);

impl ToastId {
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A queued or visible notification.
///
/// `message` is plain text and is only ever written as text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToastEntry {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ToastEntry {
    #[must_use]
    pub fn new(id: ToastId, message: impl Into<String>, kind: ToastKind, duration_ms: u64) -> Self {
        Self {
            id,
            message: message.into(),
            kind,
            duration_ms,
            created_at: chrono::Utc::now(),
        }
    }
}

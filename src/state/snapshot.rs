//! Coordination state: snapshots, patches and per-key diffs.
//!
//! State is a flat record of top-level keys. A [`StatePatch`] sets any subset
//! of them; merging patches is last-writer-wins per key, and extension keys
//! merge individually. [`StateDiff`] compares two snapshots key by key using
//! their JSON form, which is what diff-mode history stores.

use crate::domain::error::Result;
use crate::domain::{LayerSnapshot, ToastEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Immutable point-in-time copy of the coordination state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// The open layer, if any.
    pub active_layer: Option<LayerSnapshot>,
    /// Mirror of the visible toasts, oldest first.
    pub toasts: Vec<ToastEntry>,
    /// Number of layers opened since the last reset.
    pub layers_opened: u64,
    /// Number of toasts displayed since the last reset.
    pub toasts_shown: u64,
    /// Caller-defined keys.
    pub extensions: BTreeMap<String, Value>,
}

/// A shallow update to [`StateSnapshot`].
///
/// # Example
///
/// ```rust
/// use layerkit::state::{StatePatch, StateSnapshot};
///
/// let mut first = StatePatch::new().layers_opened(1).extension("theme", "dark".into());
/// first.merge(StatePatch::new().layers_opened(2));
///
/// let next = first.apply(&StateSnapshot::default());
/// assert_eq!(next.layers_opened, 2);
/// assert_eq!(next.extensions["theme"], "dark");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    pub active_layer: Option<Option<LayerSnapshot>>,
    pub toasts: Option<Vec<ToastEntry>>,
    pub layers_opened: Option<u64>,
    pub toasts_shown: Option<u64>,
    pub extensions: BTreeMap<String, Value>,
}

impl StatePatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn active_layer(mut self, layer: Option<LayerSnapshot>) -> Self {
        self.active_layer = Some(layer);
        self
    }

    #[must_use]
    pub fn toasts(mut self, toasts: Vec<ToastEntry>) -> Self {
        self.toasts = Some(toasts);
        self
    }

    #[must_use]
    pub const fn layers_opened(mut self, count: u64) -> Self {
        self.layers_opened = Some(count);
        self
    }

    #[must_use]
    pub const fn toasts_shown(mut self, count: u64) -> Self {
        self.toasts_shown = Some(count);
        self
    }

    #[must_use]
    pub fn extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active_layer.is_none()
            && self.toasts.is_none()
            && self.layers_opened.is_none()
            && self.toasts_shown.is_none()
            && self.extensions.is_empty()
    }

    /// Folds a later patch into this one; `later` wins on every key it sets.
    pub fn merge(&mut self, later: Self) {
        if later.active_layer.is_some() {
            self.active_layer = later.active_layer;
        }
        if later.toasts.is_some() {
            self.toasts = later.toasts;
        }
        if later.layers_opened.is_some() {
            self.layers_opened = later.layers_opened;
        }
        if later.toasts_shown.is_some() {
            self.toasts_shown = later.toasts_shown;
        }
        self.extensions.extend(later.extensions);
    }

    /// Produces the snapshot that results from applying this patch to `base`.
    #[must_use]
    pub fn apply(&self, base: &StateSnapshot) -> StateSnapshot {
        let mut next = base.clone();
        if let Some(layer) = &self.active_layer {
            next.active_layer.clone_from(layer);
        }
        if let Some(toasts) = &self.toasts {
            next.toasts.clone_from(toasts);
        }
        if let Some(count) = self.layers_opened {
            next.layers_opened = count;
        }
        if let Some(count) = self.toasts_shown {
            next.toasts_shown = count;
        }
        for (key, value) in &self.extensions {
            next.extensions.insert(key.clone(), value.clone());
        }
        next
    }
}

/// Old and new value of one changed key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Changed keys between two snapshots.
///
/// Top-level keys use their camelCase names; extension keys appear as
/// `extensions.<key>`, with `null` standing for an absent key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDiff {
    pub changes: BTreeMap<String, FieldChange>,
}

impl StateDiff {
    /// Computes the per-key diff from `old` to `new`.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if either snapshot cannot be converted
    /// to JSON.
    pub fn between(old: &StateSnapshot, new: &StateSnapshot) -> Result<Self> {
        let old_map = to_object(old)?;
        let new_map = to_object(new)?;
        let mut changes = BTreeMap::new();

        for (key, new_value) in &new_map {
            if key == "extensions" {
                continue;
            }
            let old_value = old_map.get(key).cloned().unwrap_or(Value::Null);
            if &old_value != new_value {
                changes.insert(
                    key.clone(),
                    FieldChange {
                        old: old_value,
                        new: new_value.clone(),
                    },
                );
            }
        }

        let keys: std::collections::BTreeSet<&String> =
            old.extensions.keys().chain(new.extensions.keys()).collect();
        for key in keys {
            let old_value = old.extensions.get(key).cloned().unwrap_or(Value::Null);
            let new_value = new.extensions.get(key).cloned().unwrap_or(Value::Null);
            if old_value != new_value {
                changes.insert(
                    format!("extensions.{key}"),
                    FieldChange {
                        old: old_value,
                        new: new_value,
                    },
                );
            }
        }

        Ok(Self { changes })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[must_use]
    pub fn changed_keys(&self) -> Vec<&str> {
        self.changes.keys().map(String::as_str).collect()
    }
}

fn to_object(snapshot: &StateSnapshot) -> Result<serde_json::Map<String, Value>> {
    match serde_json::to_value(snapshot)? {
        Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_is_last_writer_wins_per_key() {
        let mut patch = StatePatch::new().layers_opened(1).toasts_shown(4);
        patch.merge(StatePatch::new().layers_opened(3));
        assert_eq!(patch.layers_opened, Some(3));
        assert_eq!(patch.toasts_shown, Some(4));
    }

    #[test]
    fn clearing_the_layer_is_a_set_not_a_skip() {
        let mut patch = StatePatch::new().layers_opened(1);
        patch.merge(StatePatch::new().active_layer(None));
        assert_eq!(patch.active_layer, Some(None));
        assert!(!patch.is_empty());
        assert!(StatePatch::new().is_empty());
    }

    #[test]
    fn diff_reports_only_changed_keys() {
        let old = StateSnapshot::default();
        let new = StatePatch::new()
            .toasts_shown(2)
            .extension("mode", json!("compact"))
            .apply(&old);

        let diff = StateDiff::between(&old, &new).unwrap();
        assert_eq!(diff.changed_keys(), vec!["extensions.mode", "toastsShown"]);
        assert_eq!(diff.changes["toastsShown"].old, json!(0));
        assert_eq!(diff.changes["toastsShown"].new, json!(2));
        assert_eq!(diff.changes["extensions.mode"].old, Value::Null);
    }

    #[test]
    fn diff_of_identical_snapshots_is_empty() {
        let snap = StateSnapshot::default();
        assert!(StateDiff::between(&snap, &snap).unwrap().is_empty());
    }
}

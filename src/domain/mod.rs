//! Domain layer for the layer runtime.
//!
//! Core types shared by every component, independent of the document model
//! and scheduling primitives that drive them.
//!
//! # Organization
//!
//! - [`error`]: Error types, error records and result alias
//! - [`layer`]: Layer identifiers, metadata, snapshots and guarded callbacks
//! - [`toast`]: Toast kinds and entries

pub mod error;
pub mod layer;
pub mod toast;

pub use error::{ErrorKind, ErrorRecord, LayerkitError, Result};
pub use layer::{BoxError, LayerCallback, LayerId, LayerKind, LayerMeta, LayerSnapshot};
pub use toast::{ToastEntry, ToastId, ToastKind};

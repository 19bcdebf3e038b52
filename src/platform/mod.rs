//! Platform layer: the document model, virtual time and capability set.
//!
//! Everything the coordination core needs from the host page lives here, so
//! the rest of the crate never touches a real DOM or clock.

pub mod capabilities;
pub mod dom;
pub mod scheduler;

pub use capabilities::{Cancellation, IdleScheduling, MutationObservation, PlatformCapabilities};
pub use dom::{Document, MutationKind, MutationRecord, NodeId};
pub use scheduler::{TimerId, TimerQueue};

//! The layer slot and the backdrop it is mounted in.
//!
//! - [`coordinator`]: the single-active-layer state machine
//! - [`overlay`]: the shared backdrop element and scroll lock

pub mod coordinator;
pub mod overlay;

pub use coordinator::{LayerCoordinator, LayerSettings, OpenOutcome};
pub use overlay::OverlayManager;

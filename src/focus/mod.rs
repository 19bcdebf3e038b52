//! Focus management: focusable-element enumeration and the layer focus trap.

pub mod cache;
pub mod trap;

pub use cache::{is_focusable, FocusableElementCache};
pub use trap::{FocusTrap, TabOutcome};

//! Yes/no confirmation built on the layer slot.

pub mod flow;

pub use flow::{CancelToken, ConfirmFlow, ConfirmHandle, ConfirmOutcome, ControllerId};

//! Event plumbing: the generic bus and the runtime's event vocabulary.

pub mod bus;
pub mod kinds;

pub use bus::{EventBus, ListenerResult, SubscriptionId};
pub use kinds::{EventTopic, RuntimeEvent};

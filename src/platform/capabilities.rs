//! Platform capabilities injected into components at construction.
//!
//! Each optional capability is an explicit strategy rather than a flag probed
//! at call sites. A component that receives the "absent" variant degrades to
//! its documented synchronous or always-on fallback.

use serde::{Deserialize, Serialize};

/// Default bound on how long an idle-scheduled flush may be delayed.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 50;

/// Default delay for the timer-based flush fallback (one frame).
pub const DEFAULT_TIMER_FALLBACK_MS: u64 = 16;

/// How batched state updates find a moment to flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum IdleScheduling {
    /// Host idle callbacks, with a timeout so updates are never delayed
    /// indefinitely.
    Native { timeout_ms: u64 },
    /// No idle callbacks; flush after a fixed delay.
    TimerFallback { delay_ms: u64 },
    /// No deferral available; updates apply immediately.
    Unavailable,
}

impl IdleScheduling {
    /// Delay before the flush timer fires, `None` when deferral is unavailable.
    #[must_use]
    pub const fn flush_delay(self) -> Option<u64> {
        match self {
            Self::Native { timeout_ms } => Some(timeout_ms),
            Self::TimerFallback { delay_ms } => Some(delay_ms),
            Self::Unavailable => None,
        }
    }
}

/// Whether subtree mutations can be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationObservation {
    Available,
    /// Caches cannot be invalidated; focusable lists are rescanned per query.
    Unavailable,
}

/// Whether pending confirm flows can be cancelled from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cancellation {
    Supported,
    /// `cancel()` is a no-op; confirms settle only through user action.
    Unsupported,
}

/// Capability set constructed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    pub idle: IdleScheduling,
    pub mutation: MutationObservation,
    pub cancellation: Cancellation,
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self::browser()
    }
}

impl PlatformCapabilities {
    /// A modern browser: idle callbacks, mutation observers, abort signals.
    #[must_use]
    pub const fn browser() -> Self {
        Self {
            idle: IdleScheduling::Native {
                timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            },
            mutation: MutationObservation::Available,
            cancellation: Cancellation::Supported,
        }
    }

    /// Nothing optional is available.
    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            idle: IdleScheduling::Unavailable,
            mutation: MutationObservation::Unavailable,
            cancellation: Cancellation::Unsupported,
        }
    }

    #[must_use]
    pub const fn with_idle(mut self, idle: IdleScheduling) -> Self {
        self.idle = idle;
        self
    }

    #[must_use]
    pub const fn with_mutation(mut self, mutation: MutationObservation) -> Self {
        self.mutation = mutation;
        self
    }

    #[must_use]
    pub const fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }
}

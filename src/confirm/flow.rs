//! Future-returning yes/no confirmation.
//!
//! Each `confirm()` call registers a controller holding a shared settle slot.
//! The slot moves through one explicit transition and then never changes:
//!
//! ```text
//! Pending ──▶ Confirmed   (affirmative control)
//!         ──▶ Declined    (negative control, or the layer closed any other way)
//!         ──▶ Cancelled   (external cancellation)
//! ```
//!
//! The caller awaits a [`ConfirmHandle`], which resolves to `true` only for
//! `Confirmed`. Cancellation resolves to `false` and never errors.
//!
//! # Cancellation
//!
//! With [`Cancellation::Supported`] the handle carries a token. Cancelling
//! goes through the owning [`Kernel`], which settles the slot and closes the
//! layer in the same call, exactly like the cancel control. With
//! [`Cancellation::Unsupported`], [`ConfirmHandle::cancel`] is a no-op and only
//! user action settles.

use crate::builders::{ConfirmOptions, ConfirmParts, SurfaceBuilder};
use crate::domain::error::Result;
use crate::kernel::Kernel;
use crate::platform::capabilities::Cancellation;
use crate::platform::dom::{Document, NodeId};
use futures_util::future::FusedFuture;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ControllerId(u64);

impl ControllerId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Terminal state of a confirm controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmOutcome {
    Confirmed,
    Declined,
    Cancelled,
}

impl ConfirmOutcome {
    #[must_use]
    pub const fn accepted(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

#[derive(Debug, Default)]
struct Slot {
    outcome: Option<ConfirmOutcome>,
    waker: Option<Waker>,
}

type SharedSlot = Rc<RefCell<Slot>>;

/// Settles `slot` if still pending. Returns whether this call settled it.
fn settle(slot: &SharedSlot, outcome: ConfirmOutcome) -> bool {
    let waker = {
        let mut slot = slot.borrow_mut();
        if slot.outcome.is_some() {
            return false;
        }
        slot.outcome = Some(outcome);
        slot.waker.take()
    };
    if let Some(waker) = waker {
        waker.wake();
    }
    true
}

/// Token that cancels one pending confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelToken {
    id: ControllerId,
}

impl CancelToken {
    #[must_use]
    pub const fn controller_id(self) -> ControllerId {
        self.id
    }

    /// Cancels the confirm through `kernel`, closing its layer now.
    ///
    /// Returns `false` if the confirm had already settled.
    pub fn cancel(self, kernel: &mut Kernel) -> bool {
        kernel.cancel_confirm(self.id)
    }
}

/// Caller side of a confirm: element, id, cancellation and the awaited value.
#[derive(Debug)]
pub struct ConfirmHandle {
    element: Option<NodeId>,
    controller_id: Option<ControllerId>,
    slot: SharedSlot,
    token: Option<CancelToken>,
    terminated: bool,
}

impl ConfirmHandle {
    fn settled(outcome: ConfirmOutcome) -> Self {
        Self {
            element: None,
            controller_id: None,
            slot: Rc::new(RefCell::new(Slot {
                outcome: Some(outcome),
                waker: None,
            })),
            token: None,
            terminated: false,
        }
    }

    /// The confirm surface, `None` when the confirm failed to open.
    #[must_use]
    pub const fn element(&self) -> Option<NodeId> {
        self.element
    }

    #[must_use]
    pub const fn controller_id(&self) -> Option<ControllerId> {
        self.controller_id
    }

    #[must_use]
    pub fn outcome(&self) -> Option<ConfirmOutcome> {
        self.slot.borrow().outcome
    }

    #[must_use]
    pub fn can_cancel(&self) -> bool {
        self.token.is_some()
    }

    /// Cancels the confirm, resolving it to `false` and closing its layer.
    ///
    /// No-op (returns `false`) when cancellation is unsupported or the
    /// confirm already settled.
    pub fn cancel(&self, kernel: &mut Kernel) -> bool {
        self.token.is_some_and(|token| token.cancel(kernel))
    }

    #[must_use]
    pub const fn cancel_token(&self) -> Option<CancelToken> {
        self.token
    }
}

impl Future for ConfirmHandle {
    type Output = bool;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        let this = self.get_mut();
        let mut slot = this.slot.borrow_mut();
        match slot.outcome {
            Some(outcome) => {
                this.terminated = true;
                Poll::Ready(outcome.accepted())
            }
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl FusedFuture for ConfirmHandle {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

#[derive(Debug)]
struct Controller {
    id: ControllerId,
    parts: ConfirmParts,
    slot: SharedSlot,
}

#[derive(Debug)]
pub struct ConfirmFlow {
    controllers: Vec<Controller>,
    next_id: u64,
    cancellation: Cancellation,
}

impl ConfirmFlow {
    #[must_use]
    pub const fn new(cancellation: Cancellation) -> Self {
        Self {
            controllers: Vec::new(),
            next_id: 0,
            cancellation,
        }
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.controllers.len()
    }

    /// Builds the confirm surface and registers a pending controller.
    ///
    /// # Errors
    ///
    /// Propagates builder failures; nothing is registered in that case.
    pub fn build(
        &mut self,
        doc: &mut Document,
        builder: &dyn SurfaceBuilder,
        options: &ConfirmOptions,
    ) -> Result<ConfirmHandle> {
        let parts = builder.confirm(doc, options)?;
        self.next_id += 1;
        let id = ControllerId(self.next_id);
        let slot = SharedSlot::default();
        let token = (self.cancellation == Cancellation::Supported).then_some(CancelToken { id });
        self.controllers.push(Controller {
            id,
            parts,
            slot: Rc::clone(&slot),
        });
        tracing::debug!(controller = id.get(), "confirm registered");
        Ok(ConfirmHandle {
            element: Some(parts.root),
            controller_id: Some(id),
            slot,
            token,
            terminated: false,
        })
    }

    /// A handle that already resolved to `false`, for confirms that failed to
    /// open in safe mode.
    #[must_use]
    pub fn declined() -> ConfirmHandle {
        ConfirmHandle::settled(ConfirmOutcome::Declined)
    }

    /// Maps a click target to the controller and outcome it triggers.
    #[must_use]
    pub fn classify_click(&self, doc: &Document, target: NodeId) -> Option<(ControllerId, ConfirmOutcome)> {
        self.controllers.iter().find_map(|c| {
            if doc.contains(c.parts.confirm_button, target) {
                Some((c.id, ConfirmOutcome::Confirmed))
            } else if doc.contains(c.parts.cancel_button, target) {
                Some((c.id, ConfirmOutcome::Declined))
            } else {
                None
            }
        })
    }

    /// Settles controller `id` and unregisters it.
    ///
    /// Returns the confirm surface so the caller can close its layer, or
    /// `None` if the controller is unknown.
    pub fn settle(&mut self, id: ControllerId, outcome: ConfirmOutcome) -> Option<NodeId> {
        let index = self.controllers.iter().position(|c| c.id == id)?;
        let controller = self.controllers.remove(index);
        if settle(&controller.slot, outcome) {
            tracing::debug!(controller = id.get(), ?outcome, "confirm settled");
        }
        Some(controller.parts.root)
    }

    /// Cancels controller `id`. No-op when cancellation is unsupported.
    pub fn cancel(&mut self, id: ControllerId) -> Option<NodeId> {
        if self.cancellation == Cancellation::Unsupported {
            tracing::debug!(controller = id.get(), "cancellation unsupported, ignoring");
            return None;
        }
        self.settle(id, ConfirmOutcome::Cancelled)
    }

    /// Declines the controller whose surface is `element`, if any.
    pub fn on_layer_closed(&mut self, element: NodeId) {
        if let Some(id) = self
            .controllers
            .iter()
            .find(|c| c.parts.root == element)
            .map(|c| c.id)
        {
            self.settle(id, ConfirmOutcome::Declined);
        }
    }

    /// Cancels every outstanding controller, returning their surfaces.
    ///
    /// With cancellation unsupported nothing is cancelled here; pending
    /// controllers settle as declined when their layer closes.
    pub fn cancel_all(&mut self) -> Vec<NodeId> {
        if self.cancellation == Cancellation::Unsupported {
            return Vec::new();
        }
        let ids: Vec<ControllerId> = self.controllers.iter().map(|c| c.id).collect();
        ids.into_iter().filter_map(|id| self.cancel(id)).collect()
    }

    /// Declines whatever is still pending. Used at teardown.
    pub fn clear(&mut self) {
        for controller in self.controllers.drain(..) {
            settle(&controller.slot, ConfirmOutcome::Declined);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::DefaultBuilder;
    use futures_util::FutureExt;

    fn setup(cancellation: Cancellation) -> (Document, ConfirmFlow) {
        (Document::new(), ConfirmFlow::new(cancellation))
    }

    #[test]
    fn confirm_click_resolves_true_once() {
        let (mut doc, mut flow) = setup(Cancellation::Supported);
        let mut handle = flow
            .build(&mut doc, &DefaultBuilder, &ConfirmOptions::new("Delete?"))
            .unwrap();
        assert_eq!((&mut handle).now_or_never(), None);

        let confirm_button = doc.query_class(handle.element().unwrap(), "is-primary")[0];
        let (id, outcome) = flow.classify_click(&doc, confirm_button).unwrap();
        assert_eq!(outcome, ConfirmOutcome::Confirmed);
        assert!(flow.settle(id, outcome).is_some());

        assert!(flow.cancel(id).is_none());
        assert!(flow.settle(id, ConfirmOutcome::Declined).is_none());
        assert_eq!(handle.outcome(), Some(ConfirmOutcome::Confirmed));
        assert_eq!(handle.now_or_never(), Some(true));
    }

    #[test]
    fn cancel_resolves_false_and_unregisters() {
        let (mut doc, mut flow) = setup(Cancellation::Supported);
        let handle = flow
            .build(&mut doc, &DefaultBuilder, &ConfirmOptions::new("Leave?"))
            .unwrap();
        let id = handle.controller_id().unwrap();
        assert_eq!(handle.cancel_token().map(CancelToken::controller_id), Some(id));

        assert_eq!(flow.cancel(id), handle.element());
        assert!(flow.cancel(id).is_none());
        assert_eq!(flow.pending_count(), 0);
        assert_eq!(handle.outcome(), Some(ConfirmOutcome::Cancelled));
        assert_eq!(handle.now_or_never(), Some(false));
    }

    #[test]
    fn unsupported_cancellation_is_a_no_op() {
        let (mut doc, mut flow) = setup(Cancellation::Unsupported);
        let handle = flow
            .build(&mut doc, &DefaultBuilder, &ConfirmOptions::new("Leave?"))
            .unwrap();
        assert!(!handle.can_cancel());
        assert!(flow.cancel(handle.controller_id().unwrap()).is_none());
        assert!(flow.cancel_all().is_empty());
        assert_eq!(handle.outcome(), None);

        flow.on_layer_closed(handle.element().unwrap());
        assert_eq!(handle.outcome(), Some(ConfirmOutcome::Declined));
    }

    #[test]
    fn cancel_all_settles_every_controller() {
        let (mut doc, mut flow) = setup(Cancellation::Supported);
        let first = flow
            .build(&mut doc, &DefaultBuilder, &ConfirmOptions::new("one"))
            .unwrap();
        let second = flow
            .build(&mut doc, &DefaultBuilder, &ConfirmOptions::new("two"))
            .unwrap();
        assert_eq!(flow.cancel_all().len(), 2);
        assert_eq!(first.outcome(), Some(ConfirmOutcome::Cancelled));
        assert_eq!(second.outcome(), Some(ConfirmOutcome::Cancelled));
    }

    #[test]
    fn waker_fires_on_settle() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;
        use std::task::Wake;

        struct Counter(AtomicUsize);
        impl Wake for Counter {
            fn wake(self: Arc<Self>) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let (mut doc, mut flow) = setup(Cancellation::Supported);
        let mut handle = flow
            .build(&mut doc, &DefaultBuilder, &ConfirmOptions::new("ok?"))
            .unwrap();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let waker = Waker::from(Arc::clone(&counter));
        let mut cx = Context::from_waker(&waker);

        assert!(Pin::new(&mut handle).poll(&mut cx).is_pending());
        flow.settle(handle.controller_id().unwrap(), ConfirmOutcome::Declined);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(Pin::new(&mut handle).poll(&mut cx), Poll::Ready(false));
        assert!(handle.is_terminated());
    }

    #[test]
    fn declined_handle_is_already_settled() {
        let handle = ConfirmFlow::declined();
        assert!(handle.element().is_none());
        assert_eq!(handle.now_or_never(), Some(false));
    }
}

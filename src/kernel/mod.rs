//! The orchestrator composing every component behind one public surface.
//!
//! [`Kernel`] owns the shared [`Services`], the layer coordinator, the toast
//! queue and the confirm flow. Every public operation runs through one guard
//! that records failures and applies the safe-mode policy, so components can
//! simply propagate errors with `?`.
//!
//! # Architecture
//!
//! ```text
//! caller ──▶ Kernel::open_dialog ──▶ SurfaceBuilder ──▶ LayerCoordinator
//!    │                                                       │
//!    ├──▶ Kernel::handle_event (keys, clicks, readiness) ────┤
//!    │                                                       ▼
//!    └──▶ Kernel::advance ──▶ Task dispatch ──▶ StateStore / ToastQueue
//! ```
//!
//! # Lifecycle
//!
//! A kernel starts [`Lifecycle::Ready`] when its document has a body and
//! [`Lifecycle::Pending`] otherwise; [`DomEvent::DocumentReady`] retries the
//! deferred initialization. [`Kernel::destroy`] is terminal and idempotent.
//!
//! # Modules
//!
//! - [`handler`]: DOM event routing
//! - [`services`]: Collaborators shared by every component
//! - [`tasks`]: Deferred work on the timer queue

pub mod handler;
pub mod services;
pub mod tasks;

pub use handler::{DomEvent, EventOutcome};
pub use services::Services;
pub use tasks::Task;

use crate::builders::{ConfirmOptions, DefaultBuilder, DialogOptions, SheetOptions, SurfaceBuilder};
use crate::confirm::{ConfirmFlow, ConfirmHandle, ConfirmOutcome, ControllerId};
use crate::domain::error::{ErrorRecord, LayerkitError, Result};
use crate::domain::layer::{LayerId, LayerKind, LayerMeta, LayerSnapshot};
use crate::domain::toast::{ToastEntry, ToastId, ToastKind};
use crate::events::{EventTopic, ListenerResult, RuntimeEvent, SubscriptionId};
use crate::layers::LayerCoordinator;
use crate::observability::ErrorReporter;
use crate::platform::capabilities::{IdleScheduling, PlatformCapabilities};
use crate::platform::dom::{Document, NodeId};
use crate::state::{HistoryEntry, StateSnapshot};
use crate::toast::ToastQueue;
use crate::{Config, ConfigPatch};
use std::rc::Rc;

/// Where a kernel is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// The document had no body; waiting for [`DomEvent::DocumentReady`].
    Pending,
    Ready,
    /// Torn down. Mutating operations fail with [`LayerkitError::Destroyed`].
    Destroyed,
}

pub struct Kernel {
    config: Config,
    svc: Services,
    layers: LayerCoordinator,
    toasts: ToastQueue,
    confirms: ConfirmFlow,
    builder: Box<dyn SurfaceBuilder>,
    lifecycle: Lifecycle,
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("lifecycle", &self.lifecycle)
            .field("layers", &self.layers)
            .field("toasts", &self.toasts)
            .field("confirms", &self.confirms)
            .field("svc", &self.svc)
            .finish_non_exhaustive()
    }
}

impl Kernel {
    /// Creates a kernel over `document`.
    ///
    /// Initialization mounts the shared overlay. If the document has no body
    /// yet the kernel stays [`Lifecycle::Pending`] until
    /// [`DomEvent::DocumentReady`] is handled.
    #[must_use]
    pub fn new(config: Config, capabilities: PlatformCapabilities, document: Document) -> Self {
        let svc = Services::new(
            document,
            capabilities,
            config.store_options(),
            config.include_content_editable,
        );
        let mut kernel = Self {
            toasts: ToastQueue::new(config.max_toasts, config.toast_exit_delay),
            confirms: ConfirmFlow::new(capabilities.cancellation),
            layers: LayerCoordinator::new(),
            builder: Box::new(DefaultBuilder),
            lifecycle: Lifecycle::Pending,
            config,
            svc,
        };
        kernel.try_init();
        kernel
    }

    /// Replaces the surface builder.
    #[must_use]
    pub fn with_builder(mut self, builder: impl SurfaceBuilder + 'static) -> Self {
        self.builder = Box::new(builder);
        self
    }

    /// Installs an external error reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.svc.errors.set_reporter(Some(Box::new(reporter)));
        self
    }

    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub(crate) fn try_init(&mut self) {
        match self.svc.overlay.create(&mut self.svc.doc) {
            Ok(_) => {
                self.lifecycle = Lifecycle::Ready;
                tracing::debug!("kernel ready");
            }
            Err(e) if e.is_precondition() => {
                tracing::debug!(error = %e, "document not ready, deferring init");
            }
            Err(e) => {
                self.svc.record_error("init", &e);
            }
        }
    }

    /// Runs `op`, recording any failure.
    ///
    /// In safe mode failures become `Ok(None)`; otherwise they are returned
    /// after being recorded.
    fn guarded<T>(&mut self, op: &'static str, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<Option<T>> {
        let _span = tracing::debug_span!("kernel_op", op).entered();
        let result = match self.lifecycle {
            Lifecycle::Destroyed => Err(LayerkitError::Destroyed),
            Lifecycle::Pending => {
                self.try_init();
                f(self)
            }
            Lifecycle::Ready => f(self),
        };
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                self.svc.record_error(op, &e);
                if self.config.safe_mode {
                    Ok(None)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Opens a dialog, closing any active layer first.
    ///
    /// # Errors
    ///
    /// With safe mode off, returns builder and mount failures. With safe mode
    /// on, failures are only recorded.
    pub fn open_dialog(&mut self, options: DialogOptions) -> Result<&mut Self> {
        self.guarded("open_dialog", move |k| {
            let element = k.builder.dialog(&mut k.svc.doc, &options)?;
            k.open_layer(element, options.into_meta(LayerKind::Dialog))
        })?;
        Ok(self)
    }

    /// Opens a sheet, closing any active layer first.
    ///
    /// # Errors
    ///
    /// See [`Kernel::open_dialog`].
    pub fn open_sheet(&mut self, options: SheetOptions) -> Result<&mut Self> {
        self.guarded("open_sheet", move |k| {
            let element = k.builder.sheet(&mut k.svc.doc, &options)?;
            k.open_layer(element, options.surface.into_meta(LayerKind::Sheet))
        })?;
        Ok(self)
    }

    /// Shows the loader in the layer slot, or hides it.
    ///
    /// Hiding only closes the active layer when it is a loader.
    ///
    /// # Errors
    ///
    /// See [`Kernel::open_dialog`].
    pub fn set_loader(&mut self, visible: bool, text: Option<&str>) -> Result<&mut Self> {
        self.guarded("set_loader", move |k| {
            if visible {
                let element = k.builder.loader(&mut k.svc.doc, text)?;
                k.open_layer(element, LayerMeta::new(LayerKind::Loader))?;
            } else if k.active_layer().is_some_and(|l| l.kind == LayerKind::Loader) {
                k.close_layer();
            }
            Ok(())
        })?;
        Ok(self)
    }

    /// Mounts a caller-built subtree as the active layer.
    ///
    /// # Errors
    ///
    /// Returns [`LayerkitError::Precondition`] before the document has a body
    /// and [`LayerkitError::Dom`] when `element` cannot be mounted.
    pub fn open_layer(&mut self, element: NodeId, meta: LayerMeta) -> Result<LayerId> {
        if !self.svc.doc.contains_node(element) {
            return Err(LayerkitError::Dom(format!("unknown layer element {element:?}")));
        }
        let settings = self.config.layer_settings();
        let outcome = self.layers.open(&mut self.svc, element, meta, settings)?;
        if let Some(replaced) = outcome.replaced {
            self.confirms.on_layer_closed(replaced.element);
        }
        Ok(outcome.id)
    }

    /// Shows a toast, queueing it if the visible cap is reached.
    ///
    /// `duration_ms` defaults to the configured toast duration. Returns
    /// `None` once the kernel is destroyed.
    pub fn toast(&mut self, message: impl Into<String>, kind: ToastKind, duration_ms: Option<u64>) -> Option<ToastId> {
        if self.lifecycle == Lifecycle::Destroyed {
            tracing::debug!("toast ignored after destroy");
            return None;
        }
        let duration = duration_ms.unwrap_or(self.config.toast_duration);
        Some(
            self.toasts
                .show(&mut self.svc, self.builder.as_ref(), message, kind, duration),
        )
    }

    /// Chaining form of [`Kernel::toast`]. Never fails.
    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind, duration_ms: Option<u64>) -> &mut Self {
        self.toast(message, kind, duration_ms);
        self
    }

    /// Starts the exit of a visible toast, or drops a queued one.
    pub fn dismiss_toast(&mut self, id: ToastId) -> bool {
        if self.lifecycle == Lifecycle::Destroyed {
            return false;
        }
        self.toasts.dismiss(&mut self.svc, self.builder.as_ref(), id)
    }

    /// Removes every toast and empties the overflow queue.
    pub fn clear_toasts(&mut self) -> &mut Self {
        self.toasts.clear_all(&mut self.svc);
        self
    }

    /// Opens a confirmation dialog and returns a handle resolving to the
    /// user's answer.
    ///
    /// The handle resolves `true` for the confirm control and `false` for the
    /// cancel control, for any other way the layer closes, and for
    /// cancellation.
    ///
    /// # Errors
    ///
    /// With safe mode off, returns build and mount failures. With safe mode on
    /// the returned handle is already resolved to `false`.
    pub fn confirm(&mut self, options: ConfirmOptions) -> Result<ConfirmHandle> {
        let handle = self.guarded("confirm", move |k| {
            let handle = k.confirms.build(&mut k.svc.doc, k.builder.as_ref(), &options)?;
            if let (Some(element), Some(id)) = (handle.element(), handle.controller_id()) {
                if let Err(e) = k.open_layer(element, LayerMeta::new(LayerKind::Dialog)) {
                    k.confirms.settle(id, ConfirmOutcome::Declined);
                    return Err(e);
                }
            }
            Ok(handle)
        })?;
        Ok(handle.unwrap_or_else(ConfirmFlow::declined))
    }

    /// Cancels a pending confirm. The handle resolves `false` and its layer
    /// closes before this returns, through the same path as the cancel
    /// control.
    ///
    /// Returns `false` when cancellation is unsupported or the confirm
    /// already settled.
    pub fn cancel_confirm(&mut self, id: ControllerId) -> bool {
        let Some(root) = self.confirms.cancel(id) else {
            return false;
        };
        self.close_surface(root);
        true
    }

    #[must_use]
    pub fn pending_confirms(&self) -> usize {
        self.confirms.pending_count()
    }

    /// Closes the active layer. No-op when nothing is open.
    pub fn close(&mut self) -> &mut Self {
        if self.lifecycle != Lifecycle::Destroyed {
            self.close_layer();
        }
        self
    }

    pub(crate) fn close_layer(&mut self) -> Option<LayerSnapshot> {
        let closed = self.layers.close(&mut self.svc)?;
        self.confirms.on_layer_closed(closed.element);
        Some(closed)
    }

    /// Closes the layer showing `element`, or detaches `element` if it is not
    /// the active layer.
    fn close_surface(&mut self, element: NodeId) {
        if self.active_layer().is_some_and(|l| l.element == element) {
            self.close_layer();
        } else {
            self.svc.doc.remove(element);
        }
    }

    /// Tears everything down. Safe to call more than once.
    ///
    /// Pending confirms are cancelled (or declined without cancellation
    /// support), the active layer closes, toasts are removed, queued state is
    /// flushed and then cleared, and every timer is dropped.
    pub fn destroy(&mut self) {
        if self.lifecycle == Lifecycle::Destroyed {
            tracing::debug!("destroy called twice");
            return;
        }
        let _span = tracing::debug_span!("kernel_destroy").entered();

        for root in self.confirms.cancel_all() {
            self.close_surface(root);
        }
        self.close_layer();
        self.confirms.clear();
        self.toasts.destroy(&mut self.svc);

        self.svc.flush_state();
        self.svc.clear_state();
        self.svc.focus.clear(&mut self.svc.doc);
        self.svc.overlay.destroy(&mut self.svc.doc);
        let dropped = self.svc.timers.clear();

        self.lifecycle = Lifecycle::Destroyed;
        self.svc.bus.clear();
        tracing::debug!(dropped_timers = dropped, "kernel destroyed");
    }

    /// The current state snapshot.
    #[must_use]
    pub fn get_state(&self) -> Rc<StateSnapshot> {
        self.svc.store.get_state()
    }

    #[must_use]
    pub fn get_history(&self) -> Vec<HistoryEntry> {
        self.svc.store.history()
    }

    /// Exports the state history as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LayerkitError::Serialization`] if a history entry cannot be
    /// serialized.
    pub fn history_json(&self) -> Result<String> {
        self.svc.store.history_json()
    }

    #[must_use]
    pub const fn has_active_layer(&self) -> bool {
        self.layers.has_active_layer()
    }

    #[must_use]
    pub fn active_layer(&self) -> Option<&LayerSnapshot> {
        self.layers.active()
    }

    /// Visible toasts in display order.
    #[must_use]
    pub fn visible_toasts(&self) -> Vec<ToastEntry> {
        self.toasts.visible()
    }

    #[must_use]
    pub fn queued_toasts(&self) -> usize {
        self.toasts.queued_count()
    }

    /// Failures recorded so far, oldest first.
    #[must_use]
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.svc.errors.records()
    }

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.svc.doc
    }

    /// Mutable access for hosts building content or simulating the page.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.svc.doc
    }

    /// The shared backdrop element, once created.
    #[must_use]
    pub const fn overlay(&self) -> Option<NodeId> {
        self.svc.overlay.element()
    }

    #[must_use]
    pub const fn get_config(&self) -> &Config {
        &self.config
    }

    /// Merges `patch` into the configuration and applies it to live
    /// components.
    pub fn set_config(&mut self, patch: ConfigPatch) -> &mut Self {
        let _span = tracing::debug_span!("set_config").entered();
        let before = self.config.clone();
        self.config.apply_patch(patch);

        let store_options = self.config.store_options();
        if store_options != before.store_options() {
            self.svc.set_store_options(store_options);
        }

        self.toasts.set_exit_delay(self.config.toast_exit_delay);
        if self.config.max_toasts != before.max_toasts {
            self.toasts
                .set_max_visible(&mut self.svc, self.builder.as_ref(), self.config.max_toasts);
        }

        self.svc
            .focus
            .set_include_content_editable(self.config.include_content_editable);

        if self.layers.has_active_layer() {
            let arm = self.config.close_on_overlay_click;
            if arm != self.svc.overlay.is_dismiss_armed() {
                if let Err(e) = self.svc.overlay.show(&mut self.svc.doc, arm) {
                    self.svc.record_error("set_config", &e);
                }
            }
        }

        if self.config.trace_level != before.trace_level {
            tracing::debug!(
                level = self.config.trace_level.as_deref().unwrap_or("info"),
                "trace level changed; takes effect on the next subscriber install"
            );
        }
        tracing::debug!("config updated");
        self
    }

    /// Subscribes to one event topic.
    pub fn on<F>(&mut self, topic: EventTopic, mut listener: F) -> SubscriptionId
    where
        F: FnMut(&RuntimeEvent) -> ListenerResult + 'static,
    {
        self.svc.bus.subscribe(move |event: &RuntimeEvent| {
            if event.topic() == topic {
                listener(event)
            } else {
                Ok(())
            }
        })
    }

    /// Subscribes to every event.
    pub fn on_any<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&RuntimeEvent) -> ListenerResult + 'static,
    {
        self.svc.bus.subscribe(listener)
    }

    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.svc.bus.unsubscribe(id)
    }

    /// Advances virtual time by `ms`, running due timers in deadline order.
    pub fn advance(&mut self, ms: u64) -> &mut Self {
        if self.lifecycle == Lifecycle::Destroyed {
            return self;
        }
        let until = self.svc.timers.now().saturating_add(ms);
        while let Some((_, task)) = self.svc.timers.pop_due(until) {
            self.run_task(task);
        }
        self.svc.timers.set_now(until);
        self
    }

    fn run_task(&mut self, task: Task) {
        tracing::trace!(?task, now = self.svc.timers.now(), "running task");
        match task {
            Task::FlushState => self.svc.on_flush_due(),
            Task::ExpireToast(id) => self.toasts.on_expire(&mut self.svc, self.builder.as_ref(), id),
            Task::RemoveToast(id) => self.toasts.on_remove(&mut self.svc, self.builder.as_ref(), id),
        }
    }

    /// Reports an idle slot. Flushes batched state when idle scheduling is
    /// native; returns whether anything was flushed.
    pub fn run_idle(&mut self) -> bool {
        let native = matches!(self.svc.capabilities.idle, IdleScheduling::Native { .. });
        if self.lifecycle == Lifecycle::Destroyed || !native || !self.svc.store.has_pending() {
            return false;
        }
        self.svc.flush_state();
        true
    }

    /// Applies queued state updates now.
    pub fn flush_state(&mut self) -> &mut Self {
        self.svc.flush_state();
        self
    }
}

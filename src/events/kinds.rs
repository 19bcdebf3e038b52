//! Typed runtime events.
//!
//! Every notification the runtime emits is a [`RuntimeEvent`] variant, so
//! listeners match exhaustively instead of comparing event-name strings.
//! [`EventTopic`] is the coarse classification used for filtered
//! subscriptions and for the conventional `{kind}:{action}` names.

use crate::domain::{ErrorRecord, LayerKind, LayerSnapshot, ToastEntry};
use crate::state::StateSnapshot;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    /// A layer finished opening. Loader layers map to [`EventTopic::LoaderShow`].
    LayerOpened(LayerSnapshot),
    /// A layer finished closing. Loader layers map to [`EventTopic::LoaderHide`].
    LayerClosed(LayerSnapshot),
    ToastShown(ToastEntry),
    ToastHidden(ToastEntry),
    /// One applied state update (a whole batch when batching is enabled).
    StateChanged(Rc<StateSnapshot>),
    Error(ErrorRecord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    DialogOpen,
    DialogClose,
    SheetOpen,
    SheetClose,
    LoaderShow,
    LoaderHide,
    ToastShow,
    ToastHide,
    StateChange,
    Error,
}

impl EventTopic {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DialogOpen => "dialog:open",
            Self::DialogClose => "dialog:close",
            Self::SheetOpen => "sheet:open",
            Self::SheetClose => "sheet:close",
            Self::LoaderShow => "loader:show",
            Self::LoaderHide => "loader:hide",
            Self::ToastShow => "toast:show",
            Self::ToastHide => "toast:hide",
            Self::StateChange => "state:change",
            Self::Error => "error",
        }
    }
}

impl RuntimeEvent {
    #[must_use]
    pub const fn topic(&self) -> EventTopic {
        match self {
            Self::LayerOpened(layer) => match layer.kind {
                LayerKind::Dialog => EventTopic::DialogOpen,
                LayerKind::Sheet => EventTopic::SheetOpen,
                LayerKind::Loader => EventTopic::LoaderShow,
            },
            Self::LayerClosed(layer) => match layer.kind {
                LayerKind::Dialog => EventTopic::DialogClose,
                LayerKind::Sheet => EventTopic::SheetClose,
                LayerKind::Loader => EventTopic::LoaderHide,
            },
            Self::ToastShown(_) => EventTopic::ToastShow,
            Self::ToastHidden(_) => EventTopic::ToastHide,
            Self::StateChanged(_) => EventTopic::StateChange,
            Self::Error(_) => EventTopic::Error,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.topic().name()
    }
}

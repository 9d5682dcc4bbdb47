//! Overlay visibility for the panel.
//!
//! The sidebar and the three modals share a single slot: opening any of them
//! replaces whatever was open before, so at most one overlay is ever visible.
//! While an overlay is open the chat log is scroll-locked.

use std::fmt;

/// Modal dialogs of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalKind {
    /// Error report entry (Fehler melden)
    ErrorReport,
    /// Handoff document list with upload (Übergaben)
    HandoffList,
    /// Content of a single handoff document
    HandoffDetail,
}

impl ModalKind {
    /// Returns the display title for this modal.
    pub fn title(&self) -> &'static str {
        match self {
            ModalKind::ErrorReport => "Fehler melden",
            ModalKind::HandoffList => "Übergaben",
            ModalKind::HandoffDetail => "Übergabe",
        }
    }
}

/// The one overlay that may be visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overlay {
    #[default]
    None,
    Sidebar,
    Modal(ModalKind),
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Overlay::None => f.write_str("none"),
            Overlay::Sidebar => f.write_str("sidebar"),
            Overlay::Modal(kind) => f.write_str(kind.title()),
        }
    }
}

/// Single-slot overlay state.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    active: Overlay,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently visible overlay.
    pub fn active(&self) -> Overlay {
        self.active
    }

    pub fn is_sidebar_open(&self) -> bool {
        self.active == Overlay::Sidebar
    }

    /// The open modal, if any.
    pub fn modal(&self) -> Option<ModalKind> {
        match self.active {
            Overlay::Modal(kind) => Some(kind),
            _ => None,
        }
    }

    /// Whether the underlying view must not scroll.
    pub fn scroll_locked(&self) -> bool {
        self.active != Overlay::None
    }

    /// Show the sidebar, replacing any open modal.
    pub fn open_sidebar(&mut self) {
        self.replace(Overlay::Sidebar);
    }

    /// Hide the sidebar. No effect when it is not the open overlay.
    pub fn close_sidebar(&mut self) -> bool {
        if self.active == Overlay::Sidebar {
            self.replace(Overlay::None);
            true
        } else {
            false
        }
    }

    /// Show a modal, replacing the sidebar or any other modal.
    pub fn open_modal(&mut self, kind: ModalKind) {
        self.replace(Overlay::Modal(kind));
    }

    /// Hide the open modal. No effect when no modal is open.
    pub fn close_modal(&mut self) -> Option<ModalKind> {
        let closed = self.modal()?;
        self.replace(Overlay::None);
        Some(closed)
    }

    /// Escape handling: close whatever is open, modal before sidebar.
    pub fn cancel(&mut self) -> Option<Overlay> {
        match self.active {
            Overlay::None => None,
            Overlay::Modal(_) => self.close_modal().map(Overlay::Modal),
            Overlay::Sidebar => self.close_sidebar().then_some(Overlay::Sidebar),
        }
    }

    fn replace(&mut self, next: Overlay) {
        if self.active != next {
            tracing::debug!(from = %self.active, to = %next, "overlay changed");
            self.active = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_closed_and_unlocked() {
        let view = ViewState::new();
        assert_eq!(view.active(), Overlay::None);
        assert!(!view.scroll_locked());
    }

    #[test]
    fn test_sidebar_locks_scroll() {
        let mut view = ViewState::new();
        view.open_sidebar();
        assert!(view.is_sidebar_open());
        assert!(view.scroll_locked());

        assert!(view.close_sidebar());
        assert!(!view.scroll_locked());
        assert!(!view.close_sidebar());
    }

    #[test]
    fn test_opening_a_modal_closes_the_sidebar() {
        let mut view = ViewState::new();
        view.open_sidebar();
        view.open_modal(ModalKind::ErrorReport);

        assert!(!view.is_sidebar_open());
        assert_eq!(view.modal(), Some(ModalKind::ErrorReport));
    }

    #[test]
    fn test_modals_are_mutually_exclusive() {
        let mut view = ViewState::new();
        view.open_modal(ModalKind::HandoffList);
        view.open_modal(ModalKind::HandoffDetail);
        assert_eq!(view.active(), Overlay::Modal(ModalKind::HandoffDetail));

        assert_eq!(view.close_modal(), Some(ModalKind::HandoffDetail));
        assert_eq!(view.active(), Overlay::None);
    }

    #[test]
    fn test_close_sidebar_leaves_modal_alone() {
        let mut view = ViewState::new();
        view.open_modal(ModalKind::ErrorReport);
        assert!(!view.close_sidebar());
        assert_eq!(view.modal(), Some(ModalKind::ErrorReport));
    }

    #[test]
    fn test_cancel_closes_the_open_overlay() {
        let mut view = ViewState::new();
        assert_eq!(view.cancel(), None);

        view.open_sidebar();
        assert_eq!(view.cancel(), Some(Overlay::Sidebar));

        view.open_modal(ModalKind::HandoffList);
        assert_eq!(view.cancel(), Some(Overlay::Modal(ModalKind::HandoffList)));
        assert_eq!(view.active(), Overlay::None);
    }
}

//! Per-control busy tracking.
//!
//! A [`Control`] is one trigger on the page: a page-wide button such as
//! "fetch task", or the button of a single list item or chat entry. Every
//! control has one [`PendingAction`]. A control is claimed with
//! [`ActionDispatcher::try_begin`], which hands out a [`Ticket`], and released
//! with [`ActionDispatcher::finish`] when the request resolves. The flag is
//! checked before any request is built, so a busy control cannot issue a
//! second request no matter how the trigger is reached.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use steuern_client::{Action, ActionKind};

/// One trigger on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Control {
    pub kind: ActionKind,
    /// Item the trigger belongs to, `None` for page-wide controls
    pub target: Option<u64>,
}

impl Control {
    /// The page-wide control for `kind`.
    pub fn page(kind: ActionKind) -> Self {
        Self { kind, target: None }
    }

    /// The control `action` is triggered from.
    pub fn of(action: &Action) -> Self {
        Self {
            kind: action.kind(),
            target: action.target(),
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            Some(target) => write!(f, "{}[{}]", self.kind, target),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Identifies one claimed run of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Busy state of a single control.
#[derive(Debug, Clone)]
pub struct PendingAction {
    kind: ActionKind,
    busy: bool,
    ticket: Option<Ticket>,
    started: Option<Instant>,
}

impl PendingAction {
    fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            busy: false,
            ticket: None,
            started: None,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Label the control currently shows.
    pub fn label(&self) -> &'static str {
        if self.busy {
            loading_label(self.kind)
        } else {
            idle_label(self.kind)
        }
    }

    /// How long the current run has been in flight.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started.map(|started| started.elapsed())
    }

    fn release(&mut self) {
        self.busy = false;
        self.ticket = None;
        self.started = None;
    }
}

/// Label of an idle control.
pub fn idle_label(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::FetchTask => "📄 Auftrag",
        ActionKind::ReportError => "🔍 Analysieren",
        ActionKind::RunAnalysis => "📊 Projekt analysieren",
        ActionKind::ListHandoffs => "📁 Übergaben",
        ActionKind::ViewHandoff => "Anzeigen",
        ActionKind::UploadHandoff => "⬆ Hochladen",
        ActionKind::DeleteHandoff => "Löschen",
        ActionKind::SetTaskStatus => "✓ Erledigt",
        ActionKind::SubmitFeedback => "Feedback",
        ActionKind::LoadChat => "Verlauf",
        ActionKind::SendChat => "Senden",
        ActionKind::ExportPdf => "📑 PDF Export",
    }
}

/// Label of a busy control.
pub fn loading_label(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::FetchTask
        | ActionKind::ListHandoffs
        | ActionKind::ViewHandoff
        | ActionKind::LoadChat => "⌛ Lädt...",
        ActionKind::ReportError | ActionKind::RunAnalysis => "⌛ Analysiere...",
        ActionKind::UploadHandoff => "⌛ Lädt hoch...",
        ActionKind::DeleteHandoff => "⌛ Löscht...",
        ActionKind::SetTaskStatus => "⌛ Speichert...",
        ActionKind::SubmitFeedback | ActionKind::SendChat => "⌛ Sendet...",
        ActionKind::ExportPdf => "⌛ Exportiert...",
    }
}

/// System message appended when a request fails in transport.
pub fn failure_message(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::FetchTask => "Fehler beim Laden des Auftrags. Bitte versuche es erneut.",
        ActionKind::ReportError => "Fehler bei der Analyse. Bitte versuche es erneut.",
        ActionKind::RunAnalysis => "Projekt-Analyse fehlgeschlagen. Bitte versuche es erneut.",
        ActionKind::ListHandoffs => "Übergaben konnten nicht geladen werden.",
        ActionKind::ViewHandoff => "Übergabe konnte nicht geladen werden.",
        ActionKind::UploadHandoff => "Upload fehlgeschlagen.",
        ActionKind::DeleteHandoff => "Fehler beim Löschen der Übergabe.",
        ActionKind::SetTaskStatus => "Fehler beim Aktualisieren des Status.",
        ActionKind::SubmitFeedback => "Feedback konnte nicht gesendet werden.",
        ActionKind::LoadChat => "Chat-Verlauf konnte nicht geladen werden.",
        ActionKind::SendChat => "Nachricht konnte nicht gespeichert werden.",
        ActionKind::ExportPdf => "PDF-Export fehlgeschlagen.",
    }
}

/// Busy flags for all controls.
///
/// Page-wide controls always have an entry. Item controls get one while a
/// request is in flight and lose it when it resolves.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    controls: BTreeMap<Control, PendingAction>,
    next_ticket: u64,
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionDispatcher {
    /// All controls idle.
    pub fn new() -> Self {
        let controls = ActionKind::ALL
            .iter()
            .map(|kind| (Control::page(*kind), PendingAction::new(*kind)))
            .collect();
        Self {
            controls,
            next_ticket: 1,
        }
    }

    /// Claim `control`. Returns `None` while it is busy.
    pub fn try_begin(&mut self, control: Control) -> Option<Ticket> {
        let ticket = Ticket(self.next_ticket);
        let pending = self
            .controls
            .entry(control)
            .or_insert_with(|| PendingAction::new(control.kind));
        if pending.busy {
            return None;
        }
        pending.busy = true;
        pending.ticket = Some(ticket);
        pending.started = Some(Instant::now());
        self.next_ticket += 1;
        Some(ticket)
    }

    /// Release the control holding `ticket`. Stale tickets are ignored.
    pub fn finish(&mut self, ticket: Ticket) -> Option<Control> {
        let control = self
            .controls
            .iter()
            .find(|(_, pending)| pending.ticket == Some(ticket))
            .map(|(control, _)| *control)?;
        if control.target.is_some() {
            self.controls.remove(&control);
        } else if let Some(pending) = self.controls.get_mut(&control) {
            pending.release();
        }
        Some(control)
    }

    /// Release every control.
    pub fn reset(&mut self) {
        self.controls.retain(|control, _| control.target.is_none());
        for pending in self.controls.values_mut() {
            pending.release();
        }
    }

    /// Whether any control of `kind` has a request in flight.
    pub fn is_busy(&self, kind: ActionKind) -> bool {
        self.controls
            .iter()
            .any(|(control, pending)| control.kind == kind && pending.busy)
    }

    pub fn is_control_busy(&self, control: Control) -> bool {
        self.controls.get(&control).is_some_and(|pending| pending.busy)
    }

    /// Label shown for `kind`: loading while any of its controls is busy.
    pub fn label(&self, kind: ActionKind) -> &'static str {
        if self.is_busy(kind) {
            loading_label(kind)
        } else {
            idle_label(kind)
        }
    }

    /// Label of one control.
    pub fn control_label(&self, control: Control) -> &'static str {
        self.controls
            .get(&control)
            .map_or(idle_label(control.kind), PendingAction::label)
    }

    pub fn control(&self, control: Control) -> Option<&PendingAction> {
        self.controls.get(&control)
    }

    /// Number of controls with a request in flight.
    pub fn in_flight(&self) -> usize {
        self.controls.values().filter(|pending| pending.busy).count()
    }
}

//! Page controller.
//!
//! One [`PageController`] exists per opened page address. It owns the project
//! id, every piece of view state, the busy flags, the in-flight request tasks
//! and the timers. Requests run on the tokio runtime; their results come back
//! over a channel and are applied on the UI thread by
//! [`PageController::poll_completions`], so all state changes happen in one
//! place.
//!
//! A dispatch is split into two synchronous halves:
//!
//! 1. [`PageController::begin`] validates the action, claims the control and
//!    applies the immediate effects (loading label, echoed user text, cleared
//!    placeholder).
//! 2. [`PageController::complete`] releases the control and applies the
//!    response or the failure.
//!
//! The control is released before anything else in `complete`, so every
//! outcome leaves it re-triggerable.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use steuern_client::{Action, ActionKind, ActionResponse, ClientError, Document, ProjectApi, StatusPayload, TaskStatus};
use steuern_core::{
    Author, ErrorReportId, HandoffId, PanelConfig, ProjectId, TaskId, TrustedFragment, log_action_event,
    project_id_from_address,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chat_log::ChatLog;
use crate::dispatcher::{ActionDispatcher, Control, Ticket, failure_message};
use crate::handoffs::{DetailState, HandoffPanel, UploadStatus};
use crate::view::{ModalKind, Overlay, ViewState};

/// System message for actions attempted without a project id.
pub const MISSING_PROJECT_MESSAGE: &str = "Fehler: Projekt-ID nicht gefunden.";

/// Notice for an empty error report.
pub const EMPTY_ERROR_TEXT_NOTICE: &str = "Bitte gib einen Fehler-Text ein.";

/// Prefix of the user message echoing an error report.
pub const ERROR_REPORT_PREFIX: &str = "Fehler melden: ";

/// Notice for a trigger whose control still has a request in flight.
pub const BUSY_NOTICE: &str = "Diese Aktion läuft noch. Bitte warten.";

/// Outcome of [`PageController::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Request issued
    Started(Ticket),
    /// The control already has a request in flight
    Busy,
    /// No project id could be read from the page address
    MissingProject,
    /// Input rejected before any request was built
    Rejected(&'static str),
}

impl Dispatch {
    pub fn is_started(&self) -> bool {
        matches!(self, Dispatch::Started(_))
    }
}

/// A finished request, ready to be applied on the UI thread.
#[derive(Debug)]
pub struct Completion {
    pub ticket: Ticket,
    pub action: Action,
    pub result: steuern_client::Result<ActionResponse>,
    /// Where a downloaded document was written, set by the request task
    pub saved: Option<io::Result<PathBuf>>,
}

impl Completion {
    pub fn new(ticket: Ticket, action: Action, result: steuern_client::Result<ActionResponse>) -> Self {
        Self {
            ticket,
            action,
            result,
            saved: None,
        }
    }

    pub fn with_saved(mut self, saved: io::Result<PathBuf>) -> Self {
        self.saved = Some(saved);
        self
    }
}

/// Severity of a status-line notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient status-line message, the terminal counterpart of an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// Owner of all state for one page.
pub struct PageController {
    address: String,
    project: Option<ProjectId>,
    config: PanelConfig,
    api: Arc<dyn ProjectApi>,
    runtime: Handle,
    view: ViewState,
    chat: ChatLog,
    handoffs: HandoffPanel,
    dispatcher: ActionDispatcher,
    notice: Option<Notice>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: Vec<JoinHandle<()>>,
    handoff_reload_at: Option<Instant>,
    pending_resize: Option<(Instant, u16)>,
    width: u16,
}

impl PageController {
    /// Create the controller for `address`. The project id is read once here.
    pub fn new(
        address: impl Into<String>,
        config: PanelConfig,
        api: Arc<dyn ProjectApi>,
        runtime: Handle,
    ) -> Self {
        let address = address.into();
        let project = project_id_from_address(&address);
        match project {
            Some(id) => info!(project = %id, backend = api.name(), "page controller created"),
            None => warn!(address = %address, "no project id in page address"),
        }

        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            address,
            project,
            config,
            api,
            runtime,
            view: ViewState::new(),
            chat: ChatLog::new(),
            handoffs: HandoffPanel::new(),
            dispatcher: ActionDispatcher::new(),
            notice: None,
            completion_tx,
            completion_rx,
            in_flight: Vec::new(),
            handoff_reload_at: None,
            pending_resize: None,
            width: 0,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn project(&self) -> Option<ProjectId> {
        self.project
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatLog {
        &mut self.chat
    }

    pub fn handoffs(&self) -> &HandoffPanel {
        &self.handoffs
    }

    pub fn handoffs_mut(&mut self) -> &mut HandoffPanel {
        &mut self.handoffs
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Whether the terminal is wide enough to dock the sidebar.
    pub fn is_wide(&self) -> bool {
        self.width > self.config.narrow_width
    }

    /// Load the persisted conversation, if the page has a project.
    pub fn start(&mut self) -> Option<Dispatch> {
        self.project?;
        Some(self.dispatch(Action::LoadChat))
    }

    // ------------------------------------------------------------------
    // Overlays
    // ------------------------------------------------------------------

    pub fn open_sidebar(&mut self) {
        self.view.open_sidebar();
    }

    pub fn close_sidebar(&mut self) -> bool {
        self.view.close_sidebar()
    }

    pub fn toggle_sidebar(&mut self) {
        if self.view.is_sidebar_open() {
            self.view.close_sidebar();
        } else {
            self.view.open_sidebar();
        }
    }

    /// Open a modal and start loading its content. Does nothing without a
    /// project id. Returns whether the modal is now open.
    pub fn open_modal(&mut self, kind: ModalKind) -> bool {
        if self.project.is_none() {
            debug!(modal = kind.title(), "modal not opened without project id");
            return false;
        }
        self.view.open_modal(kind);
        if kind == ModalKind::HandoffList {
            self.dispatch(Action::ListHandoffs);
        }
        true
    }

    pub fn close_modal(&mut self) -> Option<ModalKind> {
        self.view.close_modal()
    }

    /// Close whatever overlay is open, modal before sidebar.
    pub fn cancel(&mut self) -> Option<Overlay> {
        self.view.cancel()
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Validate, claim and issue `action`.
    pub fn dispatch(&mut self, action: Action) -> Dispatch {
        let outcome = self.begin(&action);
        if let Dispatch::Started(ticket) = outcome {
            self.spawn(ticket, action);
        }
        outcome
    }

    /// First half of a dispatch: checks and immediate effects. No request is
    /// issued; a `Started` ticket must be passed back through
    /// [`PageController::complete`].
    pub fn begin(&mut self, action: &Action) -> Dispatch {
        let kind = action.kind();

        if let Some(reason) = self.validate(action) {
            log_action_event!(kind.name(), "rejected", reason = reason);
            return Dispatch::Rejected(reason);
        }

        if self.project.is_none() {
            self.chat.append(Author::System, MISSING_PROJECT_MESSAGE);
            log_action_event!(kind.name(), "missing_project");
            return Dispatch::MissingProject;
        }

        let control = Control::of(action);
        let Some(ticket) = self.dispatcher.try_begin(control) else {
            debug!(control = %control, "control busy, trigger ignored");
            self.notify(NoticeLevel::Info, BUSY_NOTICE);
            return Dispatch::Busy;
        };

        self.apply_started(action);
        log_action_event!(kind.name(), "started", ticket = %ticket);
        Dispatch::Started(ticket)
    }

    fn validate(&mut self, action: &Action) -> Option<&'static str> {
        match action {
            Action::ReportError { text } if text.trim().is_empty() => {
                self.notify(NoticeLevel::Error, EMPTY_ERROR_TEXT_NOTICE);
                Some(EMPTY_ERROR_TEXT_NOTICE)
            }
            Action::SendChat { text } if text.trim().is_empty() => Some("empty message"),
            Action::UploadHandoff { path } if path.as_os_str().is_empty() => {
                self.notify(NoticeLevel::Error, "Keine Datei ausgewählt.");
                Some("no file selected")
            }
            _ => None,
        }
    }

    fn apply_started(&mut self, action: &Action) {
        match action {
            Action::FetchTask | Action::RunAnalysis | Action::LoadChat => {
                self.chat.clear_placeholder();
            }
            Action::ReportError { text } => {
                if self.view.modal() == Some(ModalKind::ErrorReport) {
                    self.view.close_modal();
                }
                let preview = self.error_preview(text.trim());
                self.chat
                    .append(Author::User, format!("{ERROR_REPORT_PREFIX}{preview}"));
            }
            Action::SendChat { text } => {
                self.chat.append(Author::User, text.trim());
            }
            Action::ListHandoffs => self.handoffs.set_loading(),
            Action::ViewHandoff(id) => {
                self.handoffs.set_detail(DetailState::Loading(*id));
                self.view.open_modal(ModalKind::HandoffDetail);
            }
            Action::UploadHandoff { path } => {
                self.handoffs
                    .set_upload(UploadStatus::InProgress(display_name(path)));
            }
            Action::ExportPdf => self.notify(NoticeLevel::Info, "PDF wird erstellt..."),
            Action::DeleteHandoff(_) | Action::SetTaskStatus { .. } | Action::SubmitFeedback { .. } => {}
        }
    }

    fn error_preview(&self, text: &str) -> String {
        let limit = self.config.error_preview_chars;
        if text.chars().count() > limit {
            let head: String = text.chars().take(limit).collect();
            format!("{head}...")
        } else {
            text.to_string()
        }
    }

    fn spawn(&mut self, ticket: Ticket, action: Action) {
        let Some(project) = self.project else {
            return;
        };
        let api = Arc::clone(&self.api);
        let tx = self.completion_tx.clone();
        let export_dir = matches!(action, Action::ExportPdf).then(|| self.export_dir());
        let handle = self.runtime.spawn(async move {
            let result = api.execute(project, &action).await;
            let mut completion = Completion::new(ticket, action, result);
            if let Some(dir) = export_dir {
                let saved = match &completion.result {
                    Ok(ActionResponse::Document(document)) => Some(write_export(&dir, project, document).await),
                    _ => None,
                };
                if let Some(saved) = saved {
                    completion = completion.with_saved(saved);
                }
            }
            // The receiver is gone only after teardown.
            let _ = tx.send(completion);
        });
        self.in_flight.retain(|task| !task.is_finished());
        self.in_flight.push(handle);
    }

    /// Apply every finished request. Returns how many were applied.
    pub fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.complete(completion);
            applied += 1;
        }
        applied
    }

    /// Wait for the next finished request and apply it.
    pub async fn next_completion(&mut self) -> Option<ActionKind> {
        let completion = self.completion_rx.recv().await?;
        let kind = completion.action.kind();
        self.complete(completion);
        Some(kind)
    }

    /// Second half of a dispatch: release the control, then apply the result.
    /// Completions whose ticket is no longer held, for example after
    /// [`PageController::teardown`], are dropped.
    pub fn complete(&mut self, completion: Completion) {
        let Completion {
            ticket,
            action,
            result,
            saved,
        } = completion;
        let kind = action.kind();
        if self.dispatcher.finish(ticket).is_none() {
            warn!(action = kind.name(), ticket = %ticket, "completion for unknown ticket dropped");
            return;
        }

        match result {
            Ok(ActionResponse::Document(document)) if kind == ActionKind::ExportPdf => {
                log_action_event!(kind.name(), "completed", ticket = %ticket);
                self.export_finished(&document, saved);
            }
            Ok(response) => {
                log_action_event!(kind.name(), "completed", ticket = %ticket);
                self.apply_response(action, response);
            }
            Err(err) => {
                log_action_event!(kind.name(), "failed", ticket = %ticket, error = %err);
                self.apply_failure(&action, &err);
            }
        }
    }

    fn apply_failure(&mut self, action: &Action, err: &ClientError) {
        let kind = action.kind();
        debug!(
            action = kind.name(),
            network = err.is_network_error(),
            server = err.is_server_error(),
            "applying failure"
        );
        let message = failure_message(kind);
        self.chat.append(Author::System, message);

        match action {
            Action::ListHandoffs => self.handoffs.set_failed(message),
            Action::ViewHandoff(id) if self.handoffs.is_loading_detail(*id) => self
                .handoffs
                .set_detail(DetailState::Failed(*id, message.to_string())),
            Action::UploadHandoff { .. } => self
                .handoffs
                .set_upload(UploadStatus::Failed(err.friendly_message())),
            Action::ExportPdf | Action::DeleteHandoff(_) | Action::SetTaskStatus { .. } => {
                self.notify(NoticeLevel::Error, message);
            }
            _ => {}
        }
    }

    fn apply_response(&mut self, action: Action, response: ActionResponse) {
        match (action, response) {
            (
                Action::FetchTask | Action::ReportError { .. } | Action::RunAnalysis | Action::LoadChat,
                ActionResponse::Fragment(fragment),
            ) => {
                self.chat.append_fragment(fragment);
            }
            (Action::ListHandoffs, ActionResponse::Fragment(fragment)) => {
                self.handoffs.load(&fragment);
            }
            (Action::ViewHandoff(id), ActionResponse::Fragment(fragment)) => {
                self.show_handoff(id, fragment);
            }
            (Action::UploadHandoff { path }, ActionResponse::Status(payload)) => {
                self.upload_finished(&path, payload);
            }
            (Action::DeleteHandoff(id), ActionResponse::Status(payload)) => {
                if payload.success {
                    self.handoffs.remove(id);
                } else {
                    self.status_failed(&payload);
                }
            }
            (Action::SetTaskStatus { task, .. }, ActionResponse::Status(payload)) => {
                if payload.success {
                    self.chat.mark_task_done(task);
                } else {
                    self.status_failed(&payload);
                }
            }
            (Action::SubmitFeedback { error, success }, ActionResponse::Status(payload)) => {
                if payload.success {
                    self.chat.record_feedback(error, success);
                } else {
                    self.status_failed(&payload);
                }
            }
            (Action::SendChat { .. }, ActionResponse::Status(payload)) => {
                if !payload.success {
                    self.chat.append(
                        Author::System,
                        format!("{} {}", failure_message(ActionKind::SendChat), payload.error_text()),
                    );
                }
            }
            (action, response) => {
                warn!(action = action.kind().name(), ?response, "unexpected response shape");
                self.chat
                    .append(Author::System, failure_message(action.kind()));
            }
        }
    }

    fn show_handoff(&mut self, id: HandoffId, fragment: TrustedFragment) {
        if !self.handoffs.is_loading_detail(id) {
            debug!(handoff = %id, "detail superseded by another handoff");
            return;
        }
        self.handoffs.set_detail(DetailState::Loaded(id, fragment));
    }

    fn upload_finished(&mut self, path: &Path, payload: StatusPayload) {
        if payload.success {
            info!(
                handoff = ?payload.uebergabe_id,
                task = payload.auftrag.as_deref().unwrap_or("-"),
                "handoff uploaded"
            );
            let name = payload.filename.unwrap_or_else(|| display_name(path));
            self.handoffs.set_upload(UploadStatus::Done(name));
            self.handoff_reload_at = Some(Instant::now() + self.config.handoff_reload_delay());
        } else {
            self.handoffs
                .set_upload(UploadStatus::Failed(payload.error_text().to_string()));
        }
    }

    fn status_failed(&mut self, payload: &StatusPayload) {
        self.notify(NoticeLevel::Error, format!("Fehler: {}", payload.error_text()));
    }

    fn export_dir(&self) -> PathBuf {
        self.config
            .export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn export_finished(&mut self, document: &Document, saved: Option<io::Result<PathBuf>>) {
        self.clear_notice();
        match saved {
            Some(Ok(target)) => {
                info!(path = %target.display(), bytes = document.bytes.len(), "pdf exported");
                self.chat.append(
                    Author::System,
                    format!("PDF gespeichert: {}", target.display()),
                );
            }
            Some(Err(err)) => {
                warn!(error = %err, "pdf export not written");
                self.chat.append(
                    Author::System,
                    format!("PDF konnte nicht gespeichert werden: {err}"),
                );
            }
            None => {
                warn!(bytes = document.bytes.len(), "pdf received without a write");
                self.chat.append(
                    Author::System,
                    "PDF konnte nicht gespeichert werden.",
                );
            }
        }
    }

    /// Show a status-line notice.
    pub fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            text: text.into(),
        });
    }

    // ------------------------------------------------------------------
    // Convenience triggers
    // ------------------------------------------------------------------

    pub fn fetch_task(&mut self) -> Dispatch {
        self.dispatch(Action::FetchTask)
    }

    pub fn report_error(&mut self, text: impl Into<String>) -> Dispatch {
        self.dispatch(Action::ReportError { text: text.into() })
    }

    pub fn run_analysis(&mut self) -> Dispatch {
        self.dispatch(Action::RunAnalysis)
    }

    pub fn send_chat(&mut self, text: impl Into<String>) -> Dispatch {
        self.dispatch(Action::SendChat { text: text.into() })
    }

    pub fn mark_task_done(&mut self, task: TaskId) -> Dispatch {
        self.dispatch(Action::SetTaskStatus {
            task,
            status: TaskStatus::Done,
        })
    }

    pub fn submit_feedback(&mut self, error: ErrorReportId, success: bool) -> Dispatch {
        self.dispatch(Action::SubmitFeedback { error, success })
    }

    pub fn delete_handoff(&mut self, id: HandoffId) -> Dispatch {
        self.dispatch(Action::DeleteHandoff(id))
    }

    pub fn view_handoff(&mut self, id: HandoffId) -> Dispatch {
        self.dispatch(Action::ViewHandoff(id))
    }

    pub fn upload(&mut self, path: impl Into<PathBuf>) -> Dispatch {
        self.dispatch(Action::UploadHandoff { path: path.into() })
    }

    pub fn export_pdf(&mut self) -> Dispatch {
        self.dispatch(Action::ExportPdf)
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Record a terminal width change. The sidebar decision waits until the
    /// width has settled for the debounce interval.
    pub fn notify_resize(&mut self, width: u16, now: Instant) {
        self.width = width;
        self.pending_resize = Some((now + self.config.resize_debounce(), width));
    }

    /// Whether a handoff list reload is scheduled.
    pub fn reload_scheduled(&self) -> bool {
        self.handoff_reload_at.is_some()
    }

    /// Fire every timer that is due at `now`.
    pub fn tick(&mut self, now: Instant) {
        if self.handoff_reload_at.is_some_and(|due| due <= now) {
            self.handoff_reload_at = None;
            let outcome = self.dispatch(Action::ListHandoffs);
            debug!(?outcome, "scheduled handoff reload");
        }

        if let Some((due, width)) = self.pending_resize
            && due <= now
        {
            self.pending_resize = None;
            if width > self.config.narrow_width && self.view.close_sidebar() {
                debug!(width, "sidebar closed after resize");
            }
        }
    }

    /// Stop all in-flight requests and timers. Busy flags are released and
    /// results that arrived but were not applied yet are discarded.
    pub fn teardown(&mut self) {
        let aborted = self.in_flight.len();
        for task in self.in_flight.drain(..) {
            task.abort();
        }
        let mut discarded = 0;
        while self.completion_rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "pending completions discarded");
        }
        self.handoff_reload_at = None;
        self.pending_resize = None;
        self.dispatcher.reset();
        if aborted > 0 {
            info!(aborted, "page controller torn down");
        }
    }
}

impl Drop for PageController {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Write a downloaded PDF below `dir`. Runs on the request task.
async fn write_export(dir: &Path, project: ProjectId, document: &Document) -> io::Result<PathBuf> {
    let filename = document
        .filename
        .clone()
        .unwrap_or_else(|| format!("projekt-{project}.pdf"));
    let target = dir.join(filename);
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(&target, &document.bytes).await?;
    Ok(target)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

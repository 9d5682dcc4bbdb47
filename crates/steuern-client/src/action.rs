//! Backend actions and their request descriptors.
//!
//! Every action is scoped to a project. [`Action::request`] turns an action
//! into the method, path, body encoding and expected response shape of the
//! endpoint that serves it.

use std::fmt;
use std::path::PathBuf;

use steuern_core::{ErrorReportId, HandoffId, ProjectId, TaskId};

/// Task status values the panel can set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Done,
}

impl TaskStatus {
    /// Wire value of the `status` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Done => "fertig",
        }
    }
}

/// Discriminant of [`Action`], one per actionable control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    FetchTask,
    ReportError,
    RunAnalysis,
    ListHandoffs,
    ViewHandoff,
    UploadHandoff,
    DeleteHandoff,
    SetTaskStatus,
    SubmitFeedback,
    LoadChat,
    SendChat,
    ExportPdf,
}

impl ActionKind {
    /// All action kinds.
    pub const ALL: [ActionKind; 12] = [
        ActionKind::FetchTask,
        ActionKind::ReportError,
        ActionKind::RunAnalysis,
        ActionKind::ListHandoffs,
        ActionKind::ViewHandoff,
        ActionKind::UploadHandoff,
        ActionKind::DeleteHandoff,
        ActionKind::SetTaskStatus,
        ActionKind::SubmitFeedback,
        ActionKind::LoadChat,
        ActionKind::SendChat,
        ActionKind::ExportPdf,
    ];

    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::FetchTask => "fetch_task",
            ActionKind::ReportError => "report_error",
            ActionKind::RunAnalysis => "run_analysis",
            ActionKind::ListHandoffs => "list_handoffs",
            ActionKind::ViewHandoff => "view_handoff",
            ActionKind::UploadHandoff => "upload_handoff",
            ActionKind::DeleteHandoff => "delete_handoff",
            ActionKind::SetTaskStatus => "set_task_status",
            ActionKind::SubmitFeedback => "submit_feedback",
            ActionKind::LoadChat => "load_chat",
            ActionKind::SendChat => "send_chat",
            ActionKind::ExportPdf => "export_pdf",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A backend action triggered from the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Fetch the next open task
    FetchTask,
    /// Analyse an error report
    ReportError { text: String },
    /// Analyse the project status
    RunAnalysis,
    /// Load the handoff list
    ListHandoffs,
    /// Load one handoff's content
    ViewHandoff(HandoffId),
    /// Upload a handoff document
    UploadHandoff { path: PathBuf },
    /// Delete a handoff
    DeleteHandoff(HandoffId),
    /// Change a task's status
    SetTaskStatus { task: TaskId, status: TaskStatus },
    /// Report whether an error solution worked
    SubmitFeedback { error: ErrorReportId, success: bool },
    /// Load the persisted conversation
    LoadChat,
    /// Persist a chat message written by the user
    SendChat { text: String },
    /// Download the project documentation as PDF
    ExportPdf,
}

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Request body encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// No body
    Empty,
    /// URL-encoded form fields
    Form(Vec<(&'static str, String)>),
    /// Multipart upload of a single file
    Multipart { field: &'static str, path: PathBuf },
}

/// Expected response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Pre-rendered HTML fragment
    Fragment,
    /// JSON `{success, ...}` payload
    Status,
    /// Binary document download
    Document,
}

/// Fully resolved request for one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
    pub shape: ResponseShape,
}

impl RequestSpec {
    fn new(method: Method, path: String, body: RequestBody, shape: ResponseShape) -> Self {
        Self {
            method,
            path,
            body,
            shape,
        }
    }
}

impl Action {
    /// The control this action belongs to.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::FetchTask => ActionKind::FetchTask,
            Action::ReportError { .. } => ActionKind::ReportError,
            Action::RunAnalysis => ActionKind::RunAnalysis,
            Action::ListHandoffs => ActionKind::ListHandoffs,
            Action::ViewHandoff(_) => ActionKind::ViewHandoff,
            Action::UploadHandoff { .. } => ActionKind::UploadHandoff,
            Action::DeleteHandoff(_) => ActionKind::DeleteHandoff,
            Action::SetTaskStatus { .. } => ActionKind::SetTaskStatus,
            Action::SubmitFeedback { .. } => ActionKind::SubmitFeedback,
            Action::LoadChat => ActionKind::LoadChat,
            Action::SendChat { .. } => ActionKind::SendChat,
            Action::ExportPdf => ActionKind::ExportPdf,
        }
    }

    /// Id of the list item or chat entry the action is bound to. Actions
    /// without a target belong to a single page-wide control.
    pub fn target(&self) -> Option<u64> {
        match self {
            Action::ViewHandoff(id) | Action::DeleteHandoff(id) => Some(id.0),
            Action::SetTaskStatus { task, .. } => Some(task.0),
            Action::SubmitFeedback { error, .. } => Some(error.0),
            _ => None,
        }
    }

    /// Build the request for this action in `project`.
    pub fn request(&self, project: ProjectId) -> RequestSpec {
        use Method::{Get, Post};
        use ResponseShape::{Document, Fragment, Status};

        let base = format!("/projekt/{project}");
        match self {
            Action::FetchTask => {
                RequestSpec::new(Post, format!("{base}/auftrag"), RequestBody::Empty, Fragment)
            }
            Action::ReportError { text } => RequestSpec::new(
                Post,
                format!("{base}/fehler"),
                RequestBody::Form(vec![("fehler_text", text.trim().to_string())]),
                Fragment,
            ),
            Action::RunAnalysis => {
                RequestSpec::new(Post, format!("{base}/analysieren"), RequestBody::Empty, Fragment)
            }
            Action::ListHandoffs => {
                RequestSpec::new(Get, format!("{base}/uebergaben"), RequestBody::Empty, Fragment)
            }
            Action::ViewHandoff(id) => RequestSpec::new(
                Get,
                format!("{base}/uebergaben/{id}"),
                RequestBody::Empty,
                Fragment,
            ),
            Action::UploadHandoff { path } => RequestSpec::new(
                Post,
                format!("{base}/uebergaben/upload"),
                RequestBody::Multipart {
                    field: "file",
                    path: path.clone(),
                },
                Status,
            ),
            Action::DeleteHandoff(id) => RequestSpec::new(
                Post,
                format!("{base}/uebergaben/{id}/delete"),
                RequestBody::Empty,
                Status,
            ),
            Action::SetTaskStatus { task, status } => RequestSpec::new(
                Post,
                format!("{base}/auftrag/{task}/status"),
                RequestBody::Form(vec![("status", status.as_str().to_string())]),
                Status,
            ),
            Action::SubmitFeedback { error, success } => RequestSpec::new(
                Post,
                format!("{base}/fehler/{error}/feedback"),
                RequestBody::Form(vec![("erfolg", success.to_string())]),
                Status,
            ),
            Action::LoadChat => {
                RequestSpec::new(Get, format!("{base}/chat"), RequestBody::Empty, Fragment)
            }
            Action::SendChat { text } => RequestSpec::new(
                Post,
                format!("{base}/chat"),
                RequestBody::Form(vec![
                    ("inhalt", text.trim().to_string()),
                    ("typ", "USER".to_string()),
                ]),
                Status,
            ),
            Action::ExportPdf => {
                RequestSpec::new(Get, format!("{base}/export-pdf"), RequestBody::Empty, Document)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: ProjectId = ProjectId(7);

    #[test]
    fn test_fetch_task_request() {
        let spec = Action::FetchTask.request(P);
        assert_eq!(spec.method, Method::Post);
        assert_eq!(spec.path, "/projekt/7/auftrag");
        assert_eq!(spec.body, RequestBody::Empty);
        assert_eq!(spec.shape, ResponseShape::Fragment);
    }

    #[test]
    fn test_report_error_sends_form_text() {
        let spec = Action::ReportError {
            text: "TypeError: x is undefined".into(),
        }
        .request(P);
        assert_eq!(spec.path, "/projekt/7/fehler");
        assert_eq!(
            spec.body,
            RequestBody::Form(vec![("fehler_text", "TypeError: x is undefined".into())])
        );
    }

    #[test]
    fn test_text_fields_are_trimmed() {
        let report = Action::ReportError {
            text: "  Stacktrace\nZeile 2\n\n".into(),
        }
        .request(P);
        assert_eq!(
            report.body,
            RequestBody::Form(vec![("fehler_text", "Stacktrace\nZeile 2".into())])
        );

        let chat = Action::SendChat { text: "Hallo \n".into() }.request(P);
        assert_eq!(
            chat.body,
            RequestBody::Form(vec![("inhalt", "Hallo".into()), ("typ", "USER".into())])
        );
    }

    #[test]
    fn test_targets() {
        assert_eq!(Action::DeleteHandoff(HandoffId(3)).target(), Some(3));
        assert_eq!(Action::ViewHandoff(HandoffId(4)).target(), Some(4));
        assert_eq!(
            Action::SubmitFeedback {
                error: ErrorReportId(5),
                success: true
            }
            .target(),
            Some(5)
        );
        assert_eq!(Action::ListHandoffs.target(), None);
        assert_eq!(Action::UploadHandoff { path: PathBuf::from("a.pdf") }.target(), None);
    }

    #[test]
    fn test_handoff_paths() {
        assert_eq!(Action::ListHandoffs.request(P).method, Method::Get);
        assert_eq!(
            Action::ViewHandoff(HandoffId(3)).request(P).path,
            "/projekt/7/uebergaben/3"
        );
        let delete = Action::DeleteHandoff(HandoffId(3)).request(P);
        assert_eq!(delete.path, "/projekt/7/uebergaben/3/delete");
        assert_eq!(delete.shape, ResponseShape::Status);
    }

    #[test]
    fn test_upload_is_multipart() {
        let spec = Action::UploadHandoff {
            path: PathBuf::from("/tmp/a.pdf"),
        }
        .request(P);
        assert_eq!(spec.path, "/projekt/7/uebergaben/upload");
        assert!(matches!(spec.body, RequestBody::Multipart { field: "file", .. }));
    }

    #[test]
    fn test_status_and_feedback_forms() {
        let status = Action::SetTaskStatus {
            task: TaskId(11),
            status: TaskStatus::Done,
        }
        .request(P);
        assert_eq!(status.path, "/projekt/7/auftrag/11/status");
        assert_eq!(status.body, RequestBody::Form(vec![("status", "fertig".into())]));

        let feedback = Action::SubmitFeedback {
            error: ErrorReportId(5),
            success: false,
        }
        .request(P);
        assert_eq!(feedback.path, "/projekt/7/fehler/5/feedback");
        assert_eq!(feedback.body, RequestBody::Form(vec![("erfolg", "false".into())]));
    }

    #[test]
    fn test_every_kind_is_listed_once() {
        let mut kinds = ActionKind::ALL.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), ActionKind::ALL.len());
    }
}

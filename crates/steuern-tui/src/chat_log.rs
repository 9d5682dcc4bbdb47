//! Append-only chat log.
//!
//! Two insertion paths exist and must stay separate:
//!
//! - [`ChatLog::append`] takes plain text from the user or the panel. It is
//!   stored as a [`ChatMessage`] and escaped whenever it is rendered as
//!   markup.
//! - [`ChatLog::append_fragment`] takes a [`TrustedFragment`] returned by the
//!   backend and renders it verbatim.
//!
//! Fragment entries remember the task and error-report ids they carry so the
//! panel can mark a task done or record feedback after a status response.

use steuern_core::{Author, ChatMessage, ErrorReportId, TaskId, TrustedFragment, escape_html};

/// Shown until the first entry is appended.
pub const EMPTY_PLACEHOLDER: &str =
    "Noch keine Nachrichten. Hol dir einen Auftrag oder melde einen Fehler.";

/// Confirmation shown after a completed task.
pub const TASK_DONE_LABEL: &str = "Erledigt!";

/// Confirmation shown after positive feedback on an error analysis.
pub const FEEDBACK_SUCCESS_TEXT: &str =
    "✓ Danke für dein Feedback! Die Erfolgsrate wurde aktualisiert.";

/// Confirmation shown after negative feedback on an error analysis.
pub const FEEDBACK_FAILURE_TEXT: &str = "✓ Feedback gespeichert. Wir verbessern unsere Lösungen.";

const TASK_ATTRIBUTE: &str = "data-auftrag-id";
const ERROR_ATTRIBUTE: &str = "data-fehler-id";

/// A server fragment in the log, with the affordances it exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentEntry {
    fragment: TrustedFragment,
    task: Option<TaskId>,
    error_report: Option<ErrorReportId>,
    task_done: bool,
    feedback: Option<bool>,
}

impl FragmentEntry {
    fn new(fragment: TrustedFragment) -> Self {
        let task = fragment.numeric_attribute(TASK_ATTRIBUTE).map(TaskId);
        let error_report = fragment.numeric_attribute(ERROR_ATTRIBUTE).map(ErrorReportId);
        Self {
            fragment,
            task,
            error_report,
            task_done: false,
            feedback: None,
        }
    }

    pub fn fragment(&self) -> &TrustedFragment {
        &self.fragment
    }

    /// Task presented by this fragment, if any.
    pub fn task(&self) -> Option<TaskId> {
        self.task
    }

    /// Error analysis presented by this fragment, if any.
    pub fn error_report(&self) -> Option<ErrorReportId> {
        self.error_report
    }

    pub fn is_task_done(&self) -> bool {
        self.task_done
    }

    /// Recorded feedback value, once submitted.
    pub fn feedback(&self) -> Option<bool> {
        self.feedback
    }

    /// Confirmation text replacing the feedback controls.
    pub fn feedback_text(&self) -> Option<&'static str> {
        self.feedback.map(|success| {
            if success {
                FEEDBACK_SUCCESS_TEXT
            } else {
                FEEDBACK_FAILURE_TEXT
            }
        })
    }
}

/// One entry of the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Message(ChatMessage),
    Fragment(FragmentEntry),
}

/// Ordered, append-only log with a one-time empty placeholder.
#[derive(Debug, Clone)]
pub struct ChatLog {
    entries: Vec<LogEntry>,
    placeholder: bool,
    /// Lines scrolled up from the newest entry; 0 follows the bottom.
    scroll_back: usize,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            placeholder: true,
            scroll_back: 0,
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The empty-state text, while it is still shown.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.placeholder.then_some(EMPTY_PLACEHOLDER)
    }

    /// Remove the empty-state text. Returns whether it was present.
    pub fn clear_placeholder(&mut self) -> bool {
        std::mem::replace(&mut self.placeholder, false)
    }

    /// Append a plain-text message stamped with the current time.
    pub fn append(&mut self, author: Author, text: impl Into<String>) {
        self.push_message(ChatMessage::new(author, text));
    }

    /// Append an already constructed message.
    pub fn push_message(&mut self, message: ChatMessage) {
        self.clear_placeholder();
        self.entries.push(LogEntry::Message(message));
        self.scroll_to_bottom();
    }

    /// Append a backend fragment verbatim. Blank fragments are ignored.
    pub fn append_fragment(&mut self, fragment: TrustedFragment) -> bool {
        if fragment.is_blank() {
            return false;
        }
        self.clear_placeholder();
        self.entries
            .push(LogEntry::Fragment(FragmentEntry::new(fragment)));
        self.scroll_to_bottom();
        true
    }

    /// Newest message, if the last entry is one.
    pub fn last_message(&self) -> Option<&ChatMessage> {
        match self.entries.last()? {
            LogEntry::Message(message) => Some(message),
            LogEntry::Fragment(_) => None,
        }
    }

    fn fragments(&self) -> impl DoubleEndedIterator<Item = &FragmentEntry> {
        self.entries.iter().filter_map(|entry| match entry {
            LogEntry::Fragment(fragment) => Some(fragment),
            LogEntry::Message(_) => None,
        })
    }

    fn fragments_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut FragmentEntry> {
        self.entries.iter_mut().filter_map(|entry| match entry {
            LogEntry::Fragment(fragment) => Some(fragment),
            LogEntry::Message(_) => None,
        })
    }

    /// Newest task that has not been marked done.
    pub fn latest_open_task(&self) -> Option<TaskId> {
        self.fragments()
            .rev()
            .find(|entry| !entry.task_done && entry.task.is_some())
            .and_then(|entry| entry.task)
    }

    /// Newest error analysis still waiting for feedback.
    pub fn latest_feedback_target(&self) -> Option<ErrorReportId> {
        self.fragments()
            .rev()
            .find(|entry| entry.feedback.is_none() && entry.error_report.is_some())
            .and_then(|entry| entry.error_report)
    }

    /// Mark the entry presenting `task` as done.
    pub fn mark_task_done(&mut self, task: TaskId) -> bool {
        match self.fragments_mut().find(|entry| entry.task == Some(task)) {
            Some(entry) => {
                entry.task_done = true;
                true
            }
            None => false,
        }
    }

    /// Hide the feedback controls of `error` and record the value.
    pub fn record_feedback(&mut self, error: ErrorReportId, success: bool) -> bool {
        match self
            .fragments_mut()
            .find(|entry| entry.error_report == Some(error))
        {
            Some(entry) => {
                entry.feedback = Some(success);
                true
            }
            None => false,
        }
    }

    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_back = usize::MAX;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_back = 0;
    }

    /// Render the log as markup. Message text is escaped; fragments are
    /// emitted verbatim.
    pub fn render_html(&self) -> String {
        let mut html = String::from("<div class=\"chat-messages\">\n");
        if let Some(text) = self.placeholder() {
            html.push_str(&format!(
                "<div class=\"chat-empty\">{}</div>\n",
                escape_html(text)
            ));
        }
        for entry in &self.entries {
            match entry {
                LogEntry::Message(message) => {
                    html.push_str(&format!(
                        "<div class=\"chat-message chat-{class}\">\
                         <div class=\"message-header\">\
                         <span class=\"message-sender\">{sender}</span>\
                         <span class=\"message-time\">{time}</span>\
                         </div>\
                         <div class=\"message-content\">{body}</div>\
                         </div>\n",
                        class = message.author().css_class(),
                        sender = message.author().label(),
                        time = message.time_label(),
                        body = escape_html(message.text()),
                    ));
                }
                LogEntry::Fragment(entry) => {
                    let done = if entry.task_done { " auftrag-erledigt" } else { "" };
                    html.push_str(&format!("<div class=\"chat-fragment{done}\">"));
                    html.push_str(entry.fragment.as_html());
                    if let Some(text) = entry.feedback_text() {
                        html.push_str(&format!(
                            "<div class=\"feedback-bestaetigung\">{}</div>",
                            escape_html(text)
                        ));
                    }
                    html.push_str("</div>\n");
                }
            }
        }
        html.push_str("</div>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_removed_on_first_append() {
        let mut log = ChatLog::new();
        assert_eq!(log.placeholder(), Some(EMPTY_PLACEHOLDER));

        log.append(Author::User, "Hallo");
        assert_eq!(log.placeholder(), None);
        assert_eq!(log.len(), 1);

        log.append(Author::System, "Antwort");
        assert_eq!(log.len(), 2);
        assert!(!log.clear_placeholder());
    }

    #[test]
    fn test_render_has_one_time_span_per_message() {
        let mut log = ChatLog::new();
        for i in 0..5 {
            log.append(Author::User, format!("msg {i}"));
        }

        let html = log.render_html();
        assert_eq!(html.matches("class=\"message-time\"").count(), 5);
        assert_eq!(html.matches("chat-empty").count(), 0);
    }

    #[test]
    fn test_placeholder_rendered_once_while_empty() {
        let log = ChatLog::new();
        assert_eq!(log.render_html().matches("chat-empty").count(), 1);
    }

    #[test]
    fn test_user_text_is_rendered_literally() {
        let mut log = ChatLog::new();
        log.append(Author::User, "<script>x</script>");

        let html = log.render_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert_eq!(log.last_message().map(|m| m.text()), Some("<script>x</script>"));
    }

    #[test]
    fn test_fragments_are_rendered_verbatim() {
        let mut log = ChatLog::new();
        log.append_fragment(TrustedFragment::from_server("<div class=\"auftrag\"><b>Los</b></div>"));

        assert!(log.render_html().contains("<div class=\"auftrag\"><b>Los</b></div>"));
    }

    #[test]
    fn test_blank_fragment_keeps_placeholder() {
        let mut log = ChatLog::new();
        assert!(!log.append_fragment(TrustedFragment::from_server("  \n")));
        assert!(log.placeholder().is_some());
        assert!(log.is_empty());
    }

    #[test]
    fn test_mark_task_done() {
        let mut log = ChatLog::new();
        log.append_fragment(TrustedFragment::from_server(
            r#"<div class="auftrag" data-auftrag-id="12">A</div>"#,
        ));
        log.append_fragment(TrustedFragment::from_server(
            r#"<div class="auftrag" data-auftrag-id="13">B</div>"#,
        ));
        assert_eq!(log.latest_open_task(), Some(TaskId(13)));

        assert!(log.mark_task_done(TaskId(13)));
        assert_eq!(log.latest_open_task(), Some(TaskId(12)));
        assert!(log.render_html().contains("auftrag-erledigt"));

        assert!(!log.mark_task_done(TaskId(99)));
    }

    #[test]
    fn test_record_feedback_shows_confirmation() {
        let mut log = ChatLog::new();
        log.append_fragment(TrustedFragment::from_server(
            r#"<div class="fehler-analyse" data-fehler-id="4">Lösung</div>"#,
        ));
        assert_eq!(log.latest_feedback_target(), Some(ErrorReportId(4)));

        assert!(log.record_feedback(ErrorReportId(4), false));
        assert_eq!(log.latest_feedback_target(), None);

        let LogEntry::Fragment(entry) = &log.entries()[0] else {
            panic!("expected fragment entry");
        };
        assert_eq!(entry.feedback_text(), Some(FEEDBACK_FAILURE_TEXT));
    }

    #[test]
    fn test_scroll_follows_new_entries() {
        let mut log = ChatLog::new();
        log.append(Author::System, "a");
        log.scroll_up(5);
        assert_eq!(log.scroll_back(), 5);
        log.scroll_down(2);
        assert_eq!(log.scroll_back(), 3);

        log.append(Author::System, "b");
        assert_eq!(log.scroll_back(), 0);
    }
}

//! Event handling for the steuern TUI.
//!
//! Converts keyboard and paste input into application events. The meaning
//! of a key depends on the [`InputMode`], which the app derives from the
//! open overlay.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Application-level events that can trigger state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Load the next task into the chat
    FetchTask,
    /// Open the error report modal
    OpenErrorReport,
    /// Run the project analysis
    RunAnalysis,
    /// Open the handoff list modal
    OpenHandoffs,
    /// Export the project as PDF
    ExportPdf,
    /// Toggle the sidebar
    ToggleSidebar,
    /// Start typing a chat message
    StartChatInput,
    /// Mark the newest open task as done
    MarkTaskDone,
    /// Feedback for the newest error analysis (helped / did not help)
    Feedback(bool),
    /// Show help overlay
    ShowHelp,
    /// Request application quit
    Quit,
    /// Force quit (Ctrl+C)
    ForceQuit,
    /// Close the open overlay or leave text input
    Cancel,
    /// Navigate up in a list or scroll up
    NavigateUp,
    /// Navigate down in a list or scroll down
    NavigateDown,
    /// Page up
    PageUp,
    /// Page down
    PageDown,
    /// Jump to the oldest message
    GoToTop,
    /// Jump to the newest message
    GoToBottom,
    /// Open the selected list item
    Select,
    /// Delete the selected list item
    DeleteSelected,
    /// Ask for a file to upload
    StartUpload,
    /// Text input character
    TextInput(char),
    /// Line break in multi-line input
    Newline,
    /// Backspace in text input
    Backspace,
    /// Submit text input
    Submit,
    /// Text pasted into the terminal
    Paste(String),
    /// No action needed
    None,
}

/// Which set of key bindings is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Panel hotkeys
    #[default]
    Normal,
    /// Single-line chat message input
    ChatInput,
    /// Multi-line error text in the error report modal
    ErrorDraft,
    /// Handoff list navigation
    HandoffList,
    /// File path entry for an upload
    UploadPath,
    /// Read-only document viewer
    Viewer,
}

impl InputMode {
    /// Whether printable keys are captured as text.
    pub fn is_text_entry(&self) -> bool {
        matches!(
            self,
            InputMode::ChatInput | InputMode::ErrorDraft | InputMode::UploadPath
        )
    }
}

/// Input handler for converting key events to app events.
#[derive(Debug, Default)]
pub struct InputHandler {
    mode: InputMode,
}

impl InputHandler {
    /// Create a new input handler.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Handle a key event and return the corresponding app event.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        // Ctrl+C always force quits
        if ctrl && key.code == KeyCode::Char('c') {
            return AppEvent::ForceQuit;
        }

        if key.code == KeyCode::Esc {
            return AppEvent::Cancel;
        }

        match self.mode {
            InputMode::Normal => self.handle_normal_mode(key),
            InputMode::ChatInput | InputMode::UploadPath => self.handle_line_input(key),
            InputMode::ErrorDraft => self.handle_error_draft(key),
            InputMode::HandoffList => self.handle_handoff_list(key),
            InputMode::Viewer => self.handle_viewer(key),
        }
    }

    /// Handle bracketed paste. Outside text entry a paste only matters to
    /// the handoff list, where it stands in for dropping a file.
    pub fn handle_paste(&self, text: String) -> AppEvent {
        match self.mode {
            InputMode::ChatInput
            | InputMode::ErrorDraft
            | InputMode::UploadPath
            | InputMode::HandoffList => AppEvent::Paste(text),
            InputMode::Normal | InputMode::Viewer => AppEvent::None,
        }
    }

    fn handle_line_input(&self, key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Enter => AppEvent::Submit,
            KeyCode::Backspace => AppEvent::Backspace,
            KeyCode::Char(c) => AppEvent::TextInput(c),
            KeyCode::Up => AppEvent::NavigateUp,
            KeyCode::Down => AppEvent::NavigateDown,
            _ => AppEvent::None,
        }
    }

    fn handle_error_draft(&self, key: KeyEvent) -> AppEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('s') if ctrl => AppEvent::Submit,
            KeyCode::Enter if ctrl => AppEvent::Submit,
            KeyCode::Enter => AppEvent::Newline,
            KeyCode::Backspace => AppEvent::Backspace,
            KeyCode::Char(c) => AppEvent::TextInput(c),
            _ => AppEvent::None,
        }
    }

    fn handle_handoff_list(&self, key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => AppEvent::NavigateUp,
            KeyCode::Down | KeyCode::Char('j') => AppEvent::NavigateDown,
            KeyCode::Enter => AppEvent::Select,
            KeyCode::Delete | KeyCode::Char('x') => AppEvent::DeleteSelected,
            KeyCode::Char('o') | KeyCode::Char('O') => AppEvent::StartUpload,
            KeyCode::Char('q') | KeyCode::Char('Q') => AppEvent::Cancel,
            _ => AppEvent::None,
        }
    }

    fn handle_viewer(&self, key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => AppEvent::NavigateUp,
            KeyCode::Down | KeyCode::Char('j') => AppEvent::NavigateDown,
            KeyCode::PageUp => AppEvent::PageUp,
            KeyCode::PageDown => AppEvent::PageDown,
            KeyCode::Char('q') | KeyCode::Char('Q') => AppEvent::Cancel,
            _ => AppEvent::None,
        }
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => AppEvent::Quit,
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') => AppEvent::ShowHelp,

            // Panel actions
            KeyCode::Char('a') | KeyCode::Char('A') => AppEvent::FetchTask,
            KeyCode::Char('f') | KeyCode::Char('F') => AppEvent::OpenErrorReport,
            KeyCode::Char('n') | KeyCode::Char('N') => AppEvent::RunAnalysis,
            KeyCode::Char('u') | KeyCode::Char('U') => AppEvent::OpenHandoffs,
            KeyCode::Char('e') | KeyCode::Char('E') => AppEvent::ExportPdf,
            KeyCode::Char('s') | KeyCode::Char('S') => AppEvent::ToggleSidebar,
            KeyCode::Char('d') | KeyCode::Char('D') => AppEvent::MarkTaskDone,
            KeyCode::Char('+') => AppEvent::Feedback(true),
            KeyCode::Char('-') => AppEvent::Feedback(false),

            // Chat input activation
            KeyCode::Char(':') | KeyCode::Char('i') => {
                self.mode = InputMode::ChatInput;
                AppEvent::StartChatInput
            }

            // Scrolling
            KeyCode::Up | KeyCode::Char('k') => AppEvent::NavigateUp,
            KeyCode::Down | KeyCode::Char('j') => AppEvent::NavigateDown,
            KeyCode::PageUp => AppEvent::PageUp,
            KeyCode::PageDown => AppEvent::PageDown,
            KeyCode::Home | KeyCode::Char('g') => AppEvent::GoToTop,
            KeyCode::End | KeyCode::Char('G') => AppEvent::GoToBottom,

            _ => AppEvent::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn key_event_with_mods(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    #[test]
    fn test_action_hotkeys() {
        let mut handler = InputHandler::new();

        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('a'))),
            AppEvent::FetchTask
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('f'))),
            AppEvent::OpenErrorReport
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('n'))),
            AppEvent::RunAnalysis
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('u'))),
            AppEvent::OpenHandoffs
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('e'))),
            AppEvent::ExportPdf
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('+'))),
            AppEvent::Feedback(true)
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('-'))),
            AppEvent::Feedback(false)
        );
    }

    #[test]
    fn test_ctrl_c_force_quits_in_every_mode() {
        let mut handler = InputHandler::new();
        for mode in [
            InputMode::Normal,
            InputMode::ChatInput,
            InputMode::ErrorDraft,
            InputMode::HandoffList,
            InputMode::UploadPath,
            InputMode::Viewer,
        ] {
            handler.set_mode(mode);
            assert_eq!(
                handler.handle_key(key_event_with_mods(
                    KeyCode::Char('c'),
                    KeyModifiers::CONTROL
                )),
                AppEvent::ForceQuit
            );
        }
    }

    #[test]
    fn test_colon_enters_chat_input() {
        let mut handler = InputHandler::new();
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char(':'))),
            AppEvent::StartChatInput
        );
        assert_eq!(handler.mode(), InputMode::ChatInput);

        // Hotkeys become text while typing
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('q'))),
            AppEvent::TextInput('q')
        );
        assert_eq!(handler.handle_key(key_event(KeyCode::Enter)), AppEvent::Submit);
    }

    #[test]
    fn test_error_draft_keeps_enter_as_newline() {
        let mut handler = InputHandler::new();
        handler.set_mode(InputMode::ErrorDraft);

        assert_eq!(handler.handle_key(key_event(KeyCode::Enter)), AppEvent::Newline);
        assert_eq!(
            handler.handle_key(key_event_with_mods(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            AppEvent::Submit
        );
        assert_eq!(
            handler.handle_key(key_event_with_mods(KeyCode::Enter, KeyModifiers::CONTROL)),
            AppEvent::Submit
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('s'))),
            AppEvent::TextInput('s')
        );
    }

    #[test]
    fn test_handoff_list_bindings() {
        let mut handler = InputHandler::new();
        handler.set_mode(InputMode::HandoffList);

        assert_eq!(handler.handle_key(key_event(KeyCode::Down)), AppEvent::NavigateDown);
        assert_eq!(handler.handle_key(key_event(KeyCode::Enter)), AppEvent::Select);
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('x'))),
            AppEvent::DeleteSelected
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('o'))),
            AppEvent::StartUpload
        );
        assert_eq!(handler.handle_key(key_event(KeyCode::Esc)), AppEvent::Cancel);
    }

    #[test]
    fn test_paste_only_reaches_text_and_list_modes() {
        let mut handler = InputHandler::new();
        assert_eq!(handler.handle_paste("notes.md".into()), AppEvent::None);

        handler.set_mode(InputMode::HandoffList);
        assert_eq!(
            handler.handle_paste("notes.md".into()),
            AppEvent::Paste("notes.md".into())
        );
    }

    #[test]
    fn test_text_entry_modes() {
        assert!(InputMode::ChatInput.is_text_entry());
        assert!(InputMode::ErrorDraft.is_text_entry());
        assert!(InputMode::UploadPath.is_text_entry());
        assert!(!InputMode::Normal.is_text_entry());
        assert!(!InputMode::HandoffList.is_text_entry());
    }
}

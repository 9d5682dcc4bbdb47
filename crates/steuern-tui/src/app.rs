//! Main application state and rendering for the steuern TUI.
//!
//! The `App` owns the [`PageController`] and the text buffers of the input
//! line and the modals. It translates terminal input into controller calls
//! and draws the controller's state every frame.

use std::io;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{self, Event, KeyEvent};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use steuern_client::ActionKind;

use crate::chat_log::{LogEntry, TASK_DONE_LABEL};
use crate::controller::{Dispatch, NoticeLevel, PageController};
use crate::event::{AppEvent, InputHandler, InputMode};
use crate::handoffs::{DetailState, ListState, UploadStatus};
use crate::theme::Theme;
use crate::view::ModalKind;

/// Result type for app operations.
pub type AppResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Target frame rate.
const TARGET_FPS: u64 = 30;
const FRAME_DURATION: Duration = Duration::from_millis(1000 / TARGET_FPS);

/// Header clock refresh.
const TIMESTAMP_CACHE_DURATION: Duration = Duration::from_secs(1);

/// Width of the docked sidebar.
const SIDEBAR_WIDTH: u16 = 32;

/// Sidebar controls and their hotkeys.
const CONTROLS: [(&str, ActionKind); 5] = [
    ("a", ActionKind::FetchTask),
    ("f", ActionKind::ReportError),
    ("n", ActionKind::RunAnalysis),
    ("u", ActionKind::ListHandoffs),
    ("e", ActionKind::ExportPdf),
];

/// Main application state.
pub struct App {
    controller: PageController,
    input_handler: InputHandler,
    theme: Theme,
    should_quit: bool,
    show_help: bool,
    /// Whether the chat input line has focus
    chat_active: bool,
    chat_input: String,
    error_draft: String,
    /// Whether the handoff list asks for a file path
    upload_prompt: bool,
    upload_path: String,
    dirty: bool,
    /// Visible rows of the chat panel at the last draw
    chat_viewport: usize,
    cached_timestamp: Option<String>,
    last_timestamp_update: Instant,
}

impl App {
    /// Create the app around a page controller.
    pub fn new(controller: PageController) -> Self {
        Self {
            controller,
            input_handler: InputHandler::new(),
            theme: Theme::default(),
            should_quit: false,
            show_help: false,
            chat_active: false,
            chat_input: String::new(),
            error_draft: String::new(),
            upload_prompt: false,
            upload_path: String::new(),
            dirty: true,
            chat_viewport: 10,
            cached_timestamp: None,
            last_timestamp_update: Instant::now(),
        }
    }

    pub fn controller(&self) -> &PageController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PageController {
        &mut self.controller
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_handler.mode()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn is_help_visible(&self) -> bool {
        self.show_help
    }

    pub fn error_draft(&self) -> &str {
        &self.error_draft
    }

    pub fn chat_input(&self) -> &str {
        &self.chat_input
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Handle a key event.
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if self.show_help {
            self.show_help = false;
            self.mark_dirty();
            return;
        }
        let event = self.input_handler.handle_key(key);
        self.handle_app_event(event);
    }

    /// Handle a bracketed paste.
    pub fn handle_paste(&mut self, text: String) {
        let event = self.input_handler.handle_paste(text);
        self.handle_app_event(event);
    }

    /// Handle a terminal resize.
    pub fn handle_resize(&mut self, width: u16) {
        self.controller.notify_resize(width, Instant::now());
        self.mark_dirty();
    }

    /// Apply finished requests and due timers.
    pub fn tick(&mut self, now: Instant) {
        if self.controller.poll_completions() > 0 {
            self.mark_dirty();
        }
        self.controller.tick(now);
        self.sync_input_mode();
    }

    /// Handle an application event.
    pub fn handle_app_event(&mut self, event: AppEvent) {
        let mode = self.input_handler.mode();
        match event {
            AppEvent::FetchTask => {
                self.controller.fetch_task();
            }
            AppEvent::OpenErrorReport => {
                if self.controller.open_modal(ModalKind::ErrorReport) {
                    self.error_draft.clear();
                }
            }
            AppEvent::RunAnalysis => {
                self.controller.run_analysis();
            }
            AppEvent::OpenHandoffs => {
                self.upload_prompt = false;
                self.controller.open_modal(ModalKind::HandoffList);
            }
            AppEvent::ExportPdf => {
                self.controller.export_pdf();
            }
            AppEvent::ToggleSidebar => {
                // The sidebar is docked on wide terminals.
                if !self.controller.is_wide() {
                    self.controller.toggle_sidebar();
                }
            }
            AppEvent::StartChatInput => self.chat_active = true,
            AppEvent::MarkTaskDone => match self.controller.chat().latest_open_task() {
                Some(task) => {
                    self.controller.mark_task_done(task);
                }
                None => self
                    .controller
                    .notify(NoticeLevel::Info, "Kein offener Auftrag."),
            },
            AppEvent::Feedback(success) => match self.controller.chat().latest_feedback_target() {
                Some(error) => {
                    self.controller.submit_feedback(error, success);
                }
                None => self
                    .controller
                    .notify(NoticeLevel::Info, "Keine Fehler-Analyse für Feedback."),
            },
            AppEvent::ShowHelp => self.show_help = true,
            AppEvent::Quit | AppEvent::ForceQuit => self.should_quit = true,
            AppEvent::Cancel => self.cancel(mode),
            AppEvent::NavigateUp => self.navigate(mode, -1),
            AppEvent::NavigateDown => self.navigate(mode, 1),
            AppEvent::PageUp => self.navigate(mode, -(self.chat_viewport.max(1) as i32)),
            AppEvent::PageDown => self.navigate(mode, self.chat_viewport.max(1) as i32),
            AppEvent::GoToTop => self.controller.chat_mut().scroll_to_top(),
            AppEvent::GoToBottom => self.controller.chat_mut().scroll_to_bottom(),
            AppEvent::Select => {
                if let Some(id) = self.controller.handoffs().selected().map(|item| item.id) {
                    self.controller.view_handoff(id);
                }
            }
            AppEvent::DeleteSelected => {
                if let Some(id) = self.controller.handoffs().selected().map(|item| item.id) {
                    self.controller.delete_handoff(id);
                }
            }
            AppEvent::StartUpload => {
                self.upload_prompt = true;
                self.upload_path.clear();
            }
            AppEvent::TextInput(c) => {
                if let Some(buffer) = self.buffer_mut(mode) {
                    buffer.push(c);
                }
            }
            AppEvent::Newline => self.error_draft.push('\n'),
            AppEvent::Backspace => {
                if let Some(buffer) = self.buffer_mut(mode) {
                    buffer.pop();
                }
            }
            AppEvent::Submit => self.submit(mode),
            AppEvent::Paste(text) => self.paste(mode, text),
            AppEvent::None => {}
        }
        self.sync_input_mode();
        self.mark_dirty();
    }

    fn buffer_mut(&mut self, mode: InputMode) -> Option<&mut String> {
        match mode {
            InputMode::ChatInput => Some(&mut self.chat_input),
            InputMode::ErrorDraft => Some(&mut self.error_draft),
            InputMode::UploadPath => Some(&mut self.upload_path),
            _ => None,
        }
    }

    fn cancel(&mut self, mode: InputMode) {
        match mode {
            InputMode::ChatInput => self.chat_active = false,
            InputMode::UploadPath => self.upload_prompt = false,
            _ => {
                self.controller.cancel();
            }
        }
    }

    fn navigate(&mut self, mode: InputMode, delta: i32) {
        match mode {
            InputMode::HandoffList => {
                if delta < 0 {
                    self.controller.handoffs_mut().select_prev();
                } else {
                    self.controller.handoffs_mut().select_next();
                }
            }
            InputMode::Viewer => {
                let delta = delta.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
                self.controller.handoffs_mut().scroll_detail(delta);
            }
            _ if self.controller.view().scroll_locked() => {}
            _ => {
                let lines = delta.unsigned_abs() as usize;
                if delta < 0 {
                    self.controller.chat_mut().scroll_up(lines);
                } else {
                    self.controller.chat_mut().scroll_down(lines);
                }
            }
        }
    }

    fn submit(&mut self, mode: InputMode) {
        match mode {
            InputMode::ChatInput => {
                if !self.chat_input.trim().is_empty() {
                    let text = std::mem::take(&mut self.chat_input);
                    self.controller.send_chat(text);
                }
            }
            InputMode::ErrorDraft => {
                let outcome = self.controller.report_error(self.error_draft.clone());
                if outcome.is_started() {
                    self.error_draft.clear();
                }
            }
            InputMode::UploadPath => {
                let path = clean_dropped_path(&std::mem::take(&mut self.upload_path));
                self.upload_prompt = false;
                self.controller.upload(path);
            }
            _ => {}
        }
    }

    fn paste(&mut self, mode: InputMode, text: String) {
        match mode {
            InputMode::ChatInput => self.chat_input.push_str(&text.replace(['\r', '\n'], " ")),
            InputMode::ErrorDraft => self.error_draft.push_str(&text.replace('\r', "")),
            InputMode::UploadPath => self.upload_path.push_str(text.trim()),
            InputMode::HandoffList => {
                let outcome = self.controller.upload(clean_dropped_path(&text));
                if outcome == Dispatch::Busy {
                    self.controller
                        .notify(NoticeLevel::Info, "Ein Upload läuft bereits.");
                }
            }
            InputMode::Normal | InputMode::Viewer => {}
        }
    }

    /// Derive the key bindings from the open overlay.
    fn sync_input_mode(&mut self) {
        let modal = self.controller.view().modal();
        if modal != Some(ModalKind::HandoffList) {
            self.upload_prompt = false;
        }
        let mode = match modal {
            Some(ModalKind::ErrorReport) => InputMode::ErrorDraft,
            Some(ModalKind::HandoffList) if self.upload_prompt => InputMode::UploadPath,
            Some(ModalKind::HandoffList) => InputMode::HandoffList,
            Some(ModalKind::HandoffDetail) => InputMode::Viewer,
            None if self.chat_active => InputMode::ChatInput,
            None => InputMode::Normal,
        };
        self.input_handler.set_mode(mode);
    }

    /// Get the header clock, refreshed once per second.
    fn get_cached_timestamp(&mut self) -> String {
        if self.cached_timestamp.is_none()
            || self.last_timestamp_update.elapsed() >= TIMESTAMP_CACHE_DURATION
        {
            self.cached_timestamp = Some(Local::now().format("%H:%M:%S").to_string());
            self.last_timestamp_update = Instant::now();
        }
        self.cached_timestamp.clone().unwrap_or_default()
    }

    /// Run the main application loop.
    pub fn run(&mut self) -> AppResult<()> {
        crossterm::terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        crossterm::execute!(
            stdout,
            crossterm::terminal::EnterAlternateScreen,
            crossterm::event::EnableBracketedPaste
        )?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        if let Ok(size) = terminal.size() {
            self.controller.notify_resize(size.width, Instant::now());
        }
        self.controller.start();

        let result = self.run_loop(&mut terminal);

        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableBracketedPaste
        )?;
        terminal.show_cursor()?;

        self.controller.teardown();
        result
    }

    /// The inner event loop with frame-rate limiting.
    fn run_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> AppResult<()> {
        while !self.should_quit {
            let frame_start = Instant::now();

            self.tick(frame_start);

            let needs_redraw =
                self.take_dirty() || self.last_timestamp_update.elapsed() >= TIMESTAMP_CACHE_DURATION;
            if needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
            }

            let elapsed = frame_start.elapsed();
            let event_timeout = FRAME_DURATION
                .checked_sub(elapsed)
                .filter(|timeout| !timeout.is_zero())
                .unwrap_or(Duration::from_millis(10));

            if event::poll(event_timeout)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key_event(key),
                    Event::Paste(text) => self.handle_paste(text),
                    Event::Resize(width, _) => self.handle_resize(width),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Draw the UI.
    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(6),    // Sidebar + chat
                Constraint::Length(3), // Input line
                Constraint::Length(2), // Footer
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);

        let body = chunks[1];
        if self.controller.is_wide() {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
                .split(body);
            self.draw_sidebar(frame, columns[0]);
            self.draw_chat(frame, columns[1]);
        } else {
            self.draw_chat(frame, body);
            if self.controller.view().is_sidebar_open() {
                let overlay = Rect::new(body.x, body.y, SIDEBAR_WIDTH.min(body.width), body.height);
                frame.render_widget(Clear, overlay);
                self.draw_sidebar(frame, overlay);
            }
        }

        self.draw_input(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);

        if let Some(kind) = self.controller.view().modal() {
            self.draw_modal(frame, area, kind);
        }

        if self.show_help {
            self.draw_help_overlay(frame, area);
        }
    }

    fn draw_header(&mut self, frame: &mut Frame, area: Rect) {
        let now = self.get_cached_timestamp();
        let theme = &self.theme;

        let project = match self.controller.project() {
            Some(id) => format!("Projekt #{id}"),
            None => "kein Projekt".to_string(),
        };
        let title = format!(" NEXUS · Projekt steuern · {project} ");

        let in_flight = self.controller.dispatcher().in_flight();
        let (status_text, status_style) = if in_flight > 0 {
            (format!("[{in_flight} aktiv]"), theme.busy())
        } else if self.controller.project().is_none() {
            ("[Fehler]".to_string(), theme.error())
        } else {
            ("[bereit]".to_string(), theme.success())
        };

        let right_len = now.chars().count() + 2 + status_text.chars().count();
        let spacing = area
            .width
            .saturating_sub(title.chars().count() as u16 + right_len as u16 + 2) as usize;

        let header = Paragraph::new(Line::from(vec![
            Span::styled(title, theme.header()),
            Span::raw(" ".repeat(spacing)),
            Span::styled(now, theme.dim()),
            Span::raw("  "),
            Span::styled(status_text, status_style),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border(false)),
        );

        frame.render_widget(header, area);
    }

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.theme;
        let dispatcher = self.controller.dispatcher();

        let mut lines = vec![Line::from(Span::styled("Aktionen", theme.header())), Line::raw("")];
        for (key, kind) in CONTROLS {
            let label_style = if dispatcher.is_busy(kind) {
                theme.busy()
            } else {
                theme.text()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("[{key}] "), theme.hotkey()),
                Span::styled(dispatcher.label(kind), label_style),
            ]));
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("[d] ", theme.hotkey()),
            Span::styled(dispatcher.label(ActionKind::SetTaskStatus), theme.text()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("[+/-] ", theme.hotkey()),
            Span::styled(dispatcher.label(ActionKind::SubmitFeedback), theme.text()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("[:] ", theme.hotkey()),
            Span::styled("Chat", theme.text()),
        ]));

        let focused = self.controller.view().is_sidebar_open();
        let sidebar = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border(focused))
                .title(Span::styled(" Steuerung ", theme.header())),
        );
        frame.render_widget(sidebar, area);
    }

    /// Build the chat log as display lines wrapped to `width`.
    fn chat_lines(&self, width: usize) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let chat = self.controller.chat();
        let mut lines = Vec::new();

        if let Some(placeholder) = chat.placeholder() {
            for row in wrap_text(placeholder, width) {
                lines.push(Line::from(Span::styled(
                    row,
                    theme.dim().add_modifier(Modifier::ITALIC),
                )));
            }
        }

        for entry in chat.entries() {
            match entry {
                LogEntry::Message(message) => {
                    lines.push(Line::from(vec![
                        Span::styled(message.author().label(), theme.author(message.author())),
                        Span::raw("  "),
                        Span::styled(message.time_label(), theme.dim()),
                    ]));
                    for row in wrap_text(message.text(), width) {
                        lines.push(Line::from(Span::styled(row, theme.text())));
                    }
                }
                LogEntry::Fragment(fragment) => {
                    for row in wrap_text(&fragment.fragment().to_text(), width) {
                        lines.push(Line::from(Span::styled(row, theme.text())));
                    }
                    if fragment.task().is_some() {
                        lines.push(if fragment.is_task_done() {
                            Line::from(Span::styled(format!("✓ {TASK_DONE_LABEL}"), theme.success()))
                        } else {
                            Line::from(vec![
                                Span::styled("[d] ", theme.hotkey()),
                                Span::styled("Als erledigt markieren", theme.dim()),
                            ])
                        });
                    }
                    if fragment.error_report().is_some() {
                        lines.push(match fragment.feedback_text() {
                            Some(text) => Line::from(Span::styled(text, theme.success())),
                            None => Line::from(vec![
                                Span::styled("[+] ", theme.hotkey()),
                                Span::styled("Hat geholfen  ", theme.dim()),
                                Span::styled("[-] ", theme.hotkey()),
                                Span::styled("Hat nicht geholfen", theme.dim()),
                            ]),
                        });
                    }
                }
            }
            lines.push(Line::raw(""));
        }
        lines
    }

    fn draw_chat(&mut self, frame: &mut Frame, area: Rect) {
        let inner_width = area.width.saturating_sub(2).max(1) as usize;
        let visible = area.height.saturating_sub(2) as usize;
        self.chat_viewport = visible;

        let lines = self.chat_lines(inner_width);
        let max_offset = lines.len().saturating_sub(visible);
        let scroll_back = self.controller.chat().scroll_back().min(max_offset);
        let offset = max_offset - scroll_back;

        let title = if scroll_back > 0 {
            format!(" Chat (↑{scroll_back}) ")
        } else {
            " Chat ".to_string()
        };
        let focused = !self.controller.view().scroll_locked();
        let chat = Paragraph::new(lines)
            .scroll((offset.min(u16::MAX as usize) as u16, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.theme.border(focused))
                    .title(Span::styled(title, self.theme.header())),
            );
        frame.render_widget(chat, area);
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.theme;
        let sending = self.controller.dispatcher().is_busy(ActionKind::SendChat);

        let line = if self.input_handler.mode() == InputMode::ChatInput {
            Line::from(vec![
                Span::styled("> ", theme.hotkey()),
                Span::styled(self.chat_input.clone(), theme.text()),
                Span::styled("▏", theme.hotkey()),
            ])
        } else {
            Line::from(vec![
                Span::styled("[:] ", theme.hotkey()),
                Span::styled("Nachricht schreiben", theme.dim()),
            ])
        };

        let title = if sending {
            format!(" {} ", self.controller.dispatcher().label(ActionKind::SendChat))
        } else {
            " Nachricht ".to_string()
        };
        let input = Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border(self.input_handler.mode() == InputMode::ChatInput))
                .title(Span::styled(title, theme.dim())),
        );
        frame.render_widget(input, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.theme;
        let hints: &[(&str, &str)] = match self.input_handler.mode() {
            InputMode::Normal => &[
                ("a", "Auftrag "),
                ("f", "Fehler "),
                ("n", "Analyse "),
                ("u", "Übergaben "),
                ("e", "PDF "),
                ("s", "Seitenleiste "),
                ("?", "Hilfe "),
                ("q", "Beenden"),
            ],
            InputMode::ChatInput => &[("Enter", "Senden "), ("Esc", "Zurück")],
            InputMode::ErrorDraft => &[
                ("Ctrl+S", "Analysieren "),
                ("Enter", "Zeile "),
                ("Esc", "Abbrechen"),
            ],
            InputMode::HandoffList => &[
                ("↑↓", "Auswahl "),
                ("Enter", "Anzeigen "),
                ("x", "Löschen "),
                ("o", "Hochladen "),
                ("Esc", "Schließen"),
            ],
            InputMode::UploadPath => &[("Enter", "Hochladen "), ("Esc", "Abbrechen")],
            InputMode::Viewer => &[("↑↓", "Blättern "), ("Esc", "Schließen")],
        };

        let spans: Vec<Span> = hints
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(format!("[{key}]"), Style::default().fg(theme.colors.hotkey)),
                    Span::raw(*label),
                ]
            })
            .collect();

        let mut block = Block::default().borders(Borders::TOP);
        if let Some(notice) = self.controller.notice() {
            let style = match notice.level {
                NoticeLevel::Info => theme.busy(),
                NoticeLevel::Error => theme.error(),
            };
            block = block
                .title(Span::styled(format!(" {} ", notice.text), style))
                .title_alignment(Alignment::Right);
        }

        let footer = Paragraph::new(Line::from(spans))
            .style(theme.dim())
            .block(block);
        frame.render_widget(footer, area);
    }

    fn draw_modal(&self, frame: &mut Frame, area: Rect, kind: ModalKind) {
        let modal_area = centered_rect(area, 72, 18);
        frame.render_widget(Clear, modal_area);

        let (title, lines, scroll) = match kind {
            ModalKind::ErrorReport => (kind.title().to_string(), self.error_report_lines(), 0),
            ModalKind::HandoffList => (kind.title().to_string(), self.handoff_list_lines(), 0),
            ModalKind::HandoffDetail => {
                let (title, lines) = self.handoff_detail_lines(modal_area.width.saturating_sub(2));
                (title, lines, self.controller.handoffs().detail_scroll())
            }
        };

        let modal = Paragraph::new(lines)
            .scroll((scroll, 0))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.theme.border(true))
                    .title(Span::styled(format!(" {title} "), self.theme.header()))
                    .style(Style::default().bg(Color::Black)),
            );
        frame.render_widget(modal, modal_area);
    }

    fn error_report_lines(&self) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let mut lines = vec![
            Line::from(Span::styled(
                "Beschreibe den Fehler oder füge die Fehlermeldung ein:",
                theme.dim(),
            )),
            Line::raw(""),
        ];
        let mut draft: Vec<Line> = self
            .error_draft
            .split('\n')
            .map(|row| Line::from(Span::styled(row.to_string(), theme.text())))
            .collect();
        if let Some(last) = draft.last_mut() {
            last.push_span(Span::styled("▏", theme.hotkey()));
        }
        lines.extend(draft);
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("[Ctrl+S] ", theme.hotkey()),
            Span::styled(
                self.controller.dispatcher().label(ActionKind::ReportError),
                theme.text(),
            ),
            Span::raw("  "),
            Span::styled("[Esc] ", theme.hotkey()),
            Span::styled("Abbrechen", theme.text()),
        ]));
        lines
    }

    fn handoff_list_lines(&self) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let handoffs = self.controller.handoffs();
        let dispatcher = self.controller.dispatcher();
        let mut lines = Vec::new();

        match handoffs.list_state() {
            ListState::NotLoaded | ListState::Loading => {
                lines.push(Line::from(Span::styled(
                    dispatcher.label(ActionKind::ListHandoffs),
                    theme.busy(),
                )));
            }
            ListState::Failed(message) => {
                lines.push(Line::from(Span::styled(message.clone(), theme.error())));
            }
            ListState::Loaded => {
                if let Some(placeholder) = handoffs.placeholder() {
                    lines.push(Line::from(Span::styled(placeholder, theme.dim())));
                }
                for (index, item) in handoffs.items().iter().enumerate() {
                    let selected = index == handoffs.selected_index();
                    let marker = if selected { "▶ " } else { "  " };
                    let style = if selected {
                        theme.text().add_modifier(Modifier::BOLD)
                    } else {
                        theme.text()
                    };
                    let mut spans = vec![
                        Span::styled(marker, theme.hotkey()),
                        Span::styled(item.title.clone(), style),
                    ];
                    if !item.detail.is_empty() {
                        spans.push(Span::styled(format!("  {}", item.detail), theme.dim()));
                    }
                    lines.push(Line::from(spans));
                }
            }
        }

        lines.push(Line::raw(""));
        if let Some(status) = handoffs.upload() {
            let style = match status {
                UploadStatus::InProgress(_) => theme.busy(),
                UploadStatus::Done(_) => theme.success(),
                UploadStatus::Failed(_) => theme.error(),
            };
            lines.push(Line::from(Span::styled(status.message(), style)));
        }
        if self.upload_prompt {
            lines.push(Line::from(vec![
                Span::styled("Datei: ", theme.hotkey()),
                Span::styled(self.upload_path.clone(), theme.text()),
                Span::styled("▏", theme.hotkey()),
            ]));
        } else {
            lines.push(Line::from(vec![
                Span::styled("[o] ", theme.hotkey()),
                Span::styled(dispatcher.label(ActionKind::UploadHandoff), theme.text()),
                Span::styled("  oder Datei hier hineinziehen", theme.dim()),
            ]));
        }
        if dispatcher.is_busy(ActionKind::DeleteHandoff) {
            lines.push(Line::from(Span::styled(
                dispatcher.label(ActionKind::DeleteHandoff),
                theme.busy(),
            )));
        }
        lines
    }

    fn handoff_detail_lines(&self, width: u16) -> (String, Vec<Line<'static>>) {
        let theme = &self.theme;
        match self.controller.handoffs().detail() {
            DetailState::Empty => ("Übergabe".to_string(), Vec::new()),
            DetailState::Loading(id) => (
                format!("Übergabe #{id}"),
                vec![Line::from(Span::styled(
                    self.controller.dispatcher().label(ActionKind::ViewHandoff),
                    theme.busy(),
                ))],
            ),
            DetailState::Loaded(id, fragment) => (
                format!("Übergabe #{id}"),
                wrap_text(&fragment.to_text(), width.max(1) as usize)
                    .into_iter()
                    .map(|row| Line::from(Span::styled(row, theme.text())))
                    .collect(),
            ),
            DetailState::Failed(id, message) => (
                format!("Übergabe #{id}"),
                vec![Line::from(Span::styled(message.clone(), theme.error()))],
            ),
        }
    }

    fn draw_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let overlay_area = centered_rect(area, 60, 24);
        frame.render_widget(Clear, overlay_area);

        let help_text = "\
Projekt steuern: Tastenbelegung

Aktionen:
  a        Nächsten Auftrag laden
  f        Fehler melden
  n        Projekt analysieren
  u        Übergaben anzeigen
  e        PDF exportieren
  d        Neuesten Auftrag als erledigt markieren
  + / -    Feedback zur Fehler-Analyse
  : i      Nachricht schreiben

Ansicht:
  s        Seitenleiste ein/aus
  ↑ ↓      Chat blättern
  PgUp     Seite hoch
  PgDn     Seite runter

Allgemein:
  ?  h     Diese Hilfe
  Esc      Schließen / Abbrechen
  q        Beenden
  Ctrl+C   Sofort beenden

Beliebige Taste schließt die Hilfe.";

        let help = Paragraph::new(help_text)
            .style(self.theme.text())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.theme.border(true))
                    .title(Span::styled(" Hilfe ", self.theme.header()))
                    .style(Style::default().bg(Color::Black)),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(help, overlay_area);
    }
}

/// Centered rectangle of at most `width` x `height` inside `area`.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4)).max(1);
    let height = height.min(area.height.saturating_sub(2)).max(1);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

/// Hard-wrap `text` at `width` characters, keeping explicit line breaks.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            rows.push(String::new());
            continue;
        }
        for chunk in chars.chunks(width) {
            rows.push(chunk.iter().collect());
        }
    }
    rows
}

/// Turn a pasted or typed path into a plain file path.
fn clean_dropped_path(text: &str) -> std::path::PathBuf {
    let first = text.lines().next().unwrap_or_default().trim();
    let unquoted = first
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .or_else(|| first.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')))
        .unwrap_or(first);
    let path = unquoted.strip_prefix("file://").unwrap_or(unquoted);
    std::path::PathBuf::from(path.replace("\\ ", " "))
}

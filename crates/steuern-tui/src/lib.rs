//! Terminal UI for the "Projekt steuern" panel.
//!
//! This crate provides the ratatui interface and the state behind it:
//!
//! - [`PageController`] - Owns all state of one opened page and runs backend
//!   actions
//! - [`ViewState`] - Single overlay slot (sidebar or one modal)
//! - [`ChatLog`] - Append-only conversation with escaped text and trusted
//!   fragments
//! - [`ActionDispatcher`] - Per-control busy flags and labels
//! - [`HandoffPanel`] - Handoff list, viewer and upload status
//! - [`App`] - Event loop and rendering
//!
//! ## Hotkeys
//!
//! - `a` - Next task
//! - `f` - Report an error
//! - `n` - Analyse the project
//! - `u` - Handoff documents
//! - `e` - Export PDF
//! - `s` - Toggle sidebar
//! - `:` - Chat input
//! - `?` or `h` - Help
//! - `q` - Quit
//! - `Esc` - Close overlay

pub mod app;
pub mod chat_log;
pub mod controller;
pub mod dispatcher;
pub mod event;
pub mod handoffs;
pub mod theme;
pub mod view;

pub use app::{App, AppResult};
pub use chat_log::{ChatLog, FragmentEntry, LogEntry};
pub use controller::{Completion, Dispatch, Notice, NoticeLevel, PageController};
pub use dispatcher::{ActionDispatcher, Control, PendingAction, Ticket};
pub use handoffs::{DetailState, HandoffItem, HandoffPanel, ListState, UploadStatus};
pub use view::{ModalKind, Overlay, ViewState};
